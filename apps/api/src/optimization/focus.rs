use serde::{Deserialize, Serialize};

/// The seven optimization focuses offered to the user.
///
/// Serialized by label ("ATS Keyword Optimizer"); the snake_case id is
/// accepted on input as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimizationFocus {
    #[serde(rename = "ATS Keyword Optimizer", alias = "ats_keywords")]
    AtsKeywords,
    #[serde(rename = "Experience Enhancer", alias = "experience")]
    Experience,
    #[serde(rename = "Skills Hierarchy", alias = "skills")]
    Skills,
    #[serde(rename = "Professional Summary", alias = "summary")]
    Summary,
    #[serde(rename = "Education Optimizer", alias = "education")]
    Education,
    #[serde(rename = "Technical Skills", alias = "technical_skills")]
    TechnicalSkills,
    #[serde(rename = "Career Gap Handling", alias = "career_gaps")]
    CareerGaps,
}

impl OptimizationFocus {
    pub const ALL: [OptimizationFocus; 7] = [
        OptimizationFocus::AtsKeywords,
        OptimizationFocus::Experience,
        OptimizationFocus::Skills,
        OptimizationFocus::Summary,
        OptimizationFocus::Education,
        OptimizationFocus::TechnicalSkills,
        OptimizationFocus::CareerGaps,
    ];

    pub fn id(self) -> &'static str {
        match self {
            OptimizationFocus::AtsKeywords => "ats_keywords",
            OptimizationFocus::Experience => "experience",
            OptimizationFocus::Skills => "skills",
            OptimizationFocus::Summary => "summary",
            OptimizationFocus::Education => "education",
            OptimizationFocus::TechnicalSkills => "technical_skills",
            OptimizationFocus::CareerGaps => "career_gaps",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OptimizationFocus::AtsKeywords => "ATS Keyword Optimizer",
            OptimizationFocus::Experience => "Experience Enhancer",
            OptimizationFocus::Skills => "Skills Hierarchy",
            OptimizationFocus::Summary => "Professional Summary",
            OptimizationFocus::Education => "Education Optimizer",
            OptimizationFocus::TechnicalSkills => "Technical Skills",
            OptimizationFocus::CareerGaps => "Career Gap Handling",
        }
    }

    /// The task sentence placed in the prompt.
    pub fn instruction(self) -> &'static str {
        match self {
            OptimizationFocus::AtsKeywords => {
                "Identify missing ATS keywords and suggest improvements."
            }
            OptimizationFocus::Experience => {
                "Enhance experience section with measurable achievements."
            }
            OptimizationFocus::Skills => "Organize and rank skills as per job requirements.",
            OptimizationFocus::Summary => {
                "Write a strong professional summary tailored for the job."
            }
            OptimizationFocus::Education => "Highlight education relevant to this job.",
            OptimizationFocus::TechnicalSkills => "Optimize technical skills section.",
            OptimizationFocus::CareerGaps => "Frame career gaps positively and professionally.",
        }
    }
}

/// One row of `GET /api/v1/focuses`.
#[derive(Debug, Serialize)]
pub struct FocusDescriptor {
    pub id: &'static str,
    pub label: &'static str,
    pub instruction: &'static str,
}

pub fn describe_all() -> Vec<FocusDescriptor> {
    OptimizationFocus::ALL
        .iter()
        .map(|f| FocusDescriptor {
            id: f.id(),
            label: f.label(),
            instruction: f.instruction(),
        })
        .collect()
}
