//! Embedded portal scripts
//!
//! The in-page collaborators: the captcha solver and one script per data
//! category. Each extraction script is a function literal taking the semester
//! id as its only parameter. Embedded at compile time so nothing is read from
//! disk per request.

/// In-page captcha solver
pub const CAPTCHA_SOLVER: &str = include_str!("../../scripts/captcha_solver.js");

/// Semester discovery script, always run first
pub const SEMESTER_DISCOVERY: &str = include_str!("../../scripts/semester.js");

/// Remaining extraction scripts in declared run order
pub const EXTRACTORS: &[(&str, &str)] = &[
    ("Attendance", include_str!("../../scripts/attendance.js")),
    ("Course", include_str!("../../scripts/course.js")),
    ("Marks", include_str!("../../scripts/marks.js")),
    ("CGPA", include_str!("../../scripts/cgpa.js")),
    ("ExamSchedule", include_str!("../../scripts/exam_schedule.js")),
];
