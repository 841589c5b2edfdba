use serde::{Deserialize, Serialize};

/// A skill proposed by a skill-tree expansion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSkill {
    pub id: String,
    pub name: String,
    pub description: String,
    pub level: u32,
    #[serde(default)]
    pub prerequisites: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillTreeExpansion {
    pub new_skills: Vec<NewSkill>,
}

impl SkillTreeExpansion {
    pub fn is_empty(&self) -> bool {
        self.new_skills.is_empty()
    }
}
