//! The REST operations the client knows about, as plain data.

use std::fmt;

use crate::transport::Method;

/// One logical API operation with its identifiers filled in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Endpoint {
    UserInfo,
    Courses,
    Assessments {
        course: String,
    },
    AssessmentDetails {
        course: String,
        assessment: String,
    },
    Problems {
        course: String,
        assessment: String,
    },
    Enrollments {
        course: String,
    },
    CreateEnrollment {
        course: String,
        email: String,
    },
    UpdateEnrollment {
        course: String,
        email: String,
    },
    DeleteEnrollment {
        course: String,
        email: String,
    },
    Handout {
        course: String,
        assessment: String,
    },
    Writeup {
        course: String,
        assessment: String,
    },
    Submit {
        course: String,
        assessment: String,
    },
    Submissions {
        course: String,
        assessment: String,
    },
    Feedback {
        course: String,
        assessment: String,
        version: u32,
        problem: String,
    },
}

/// Method, path below `api/v{n}`, fixed parameters and transfer flags of an endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    pub method: Method,
    pub segments: Vec<String>,
    pub params: Vec<(&'static str, String)>,
    pub upload: bool,
    /// Fallback file name when the endpoint may answer with a file.
    pub download_name: Option<&'static str>,
}

impl Route {
    fn get(segments: Vec<String>) -> Self {
        Self {
            method: Method::Get,
            segments,
            params: Vec::new(),
            upload: false,
            download_name: None,
        }
    }

    fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    fn param(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.params.push((key, value.into()));
        self
    }

    fn upload(mut self) -> Self {
        self.upload = true;
        self
    }

    fn download(mut self, name: &'static str) -> Self {
        self.download_name = Some(name);
        self
    }
}

fn assessment_path(course: &str, assessment: &str, rest: &[&str]) -> Vec<String> {
    let mut segments = vec![
        "courses".to_string(),
        course.to_string(),
        "assessments".to_string(),
        assessment.to_string(),
    ];
    segments.extend(rest.iter().map(|s| s.to_string()));
    segments
}

fn enrollment_path(course: &str, email: Option<&str>) -> Vec<String> {
    let mut segments = vec![
        "courses".to_string(),
        course.to_string(),
        "course_user_data".to_string(),
    ];
    segments.extend(email.map(str::to_string));
    segments
}

impl Endpoint {
    pub fn route(&self) -> Route {
        match self {
            Endpoint::UserInfo => Route::get(vec!["user".into()]),
            Endpoint::Courses => {
                Route::get(vec!["courses".into()]).param("state", "current")
            }
            Endpoint::Assessments { course } => Route::get(vec![
                "courses".into(),
                course.clone(),
                "assessments".into(),
            ]),
            Endpoint::AssessmentDetails { course, assessment } => {
                Route::get(assessment_path(course, assessment, &[]))
            }
            Endpoint::Problems { course, assessment } => {
                Route::get(assessment_path(course, assessment, &["problems"]))
            }
            Endpoint::Enrollments { course } => Route::get(enrollment_path(course, None)),
            Endpoint::CreateEnrollment { course, email } => {
                Route::get(enrollment_path(course, None))
                    .method(Method::Post)
                    .param("email", email.as_str())
            }
            Endpoint::UpdateEnrollment { course, email } => {
                Route::get(enrollment_path(course, Some(email))).method(Method::Put)
            }
            Endpoint::DeleteEnrollment { course, email } => {
                Route::get(enrollment_path(course, Some(email))).method(Method::Delete)
            }
            Endpoint::Handout { course, assessment } => {
                Route::get(assessment_path(course, assessment, &["handout"]))
                    .download("handout")
            }
            Endpoint::Writeup { course, assessment } => {
                Route::get(assessment_path(course, assessment, &["writeup"]))
                    .download("writeup")
            }
            Endpoint::Submit { course, assessment } => {
                Route::get(assessment_path(course, assessment, &["submit"]))
                    .method(Method::Post)
                    .upload()
            }
            Endpoint::Submissions { course, assessment } => {
                Route::get(assessment_path(course, assessment, &["submissions"]))
            }
            Endpoint::Feedback {
                course,
                assessment,
                version,
                problem,
            } => {
                let version = version.to_string();
                Route::get(assessment_path(
                    course,
                    assessment,
                    &["submissions", version.as_str(), "feedback"],
                ))
                .param("problem", problem.as_str())
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::UserInfo => "get_user_info",
            Endpoint::Courses => "get_courses",
            Endpoint::Assessments { .. } => "get_assessments",
            Endpoint::AssessmentDetails { .. } => "get_assessment_details",
            Endpoint::Problems { .. } => "get_problems",
            Endpoint::Enrollments { .. } => "get_enrollments",
            Endpoint::CreateEnrollment { .. } => "create_enrollment",
            Endpoint::UpdateEnrollment { .. } => "update_enrollment",
            Endpoint::DeleteEnrollment { .. } => "delete_enrollment",
            Endpoint::Handout { .. } => "download_handout",
            Endpoint::Writeup { .. } => "download_writeup",
            Endpoint::Submit { .. } => "submit_assessment",
            Endpoint::Submissions { .. } => "get_submissions",
            Endpoint::Feedback { .. } => "get_feedback",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
