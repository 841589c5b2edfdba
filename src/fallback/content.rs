//! Locally generated substitutes for explanations and skill-tree expansions.

use super::pool::FallbackPool;
use crate::types::{ExplanationRequest, NewSkill, SkillTreeExpansion, SkillTreeRequest};

pub(crate) fn explanation(pool: &FallbackPool, req: &ExplanationRequest) -> String {
    let stored = pool
        .find(&req.question)
        .map(|q| q.explanation.trim())
        .filter(|e| !e.is_empty());

    let mut text = if req.user_answer == req.correct_answer {
        format!("Correct! \"{}\" is the right answer.", req.correct_answer)
    } else {
        format!(
            "The correct answer is \"{}\", not \"{}\".",
            req.correct_answer, req.user_answer
        )
    };
    match stored {
        Some(e) => {
            text.push(' ');
            text.push_str(e);
        }
        None => text.push_str(&format!(
            " Review the core ideas of {} and try a similar question to reinforce them.",
            req.topic
        )),
    }
    text
}

fn slug(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

/// Three chained sub-skills: fundamentals → practice → advanced.
pub(crate) fn skill_tree(req: &SkillTreeRequest) -> SkillTreeExpansion {
    let templates = [
        ("fundamentals", "{} Fundamentals", "Core concepts and vocabulary of {}."),
        ("practice", "{} in Practice", "Apply {} to small, realistic exercises."),
        ("advanced", "Advanced {}", "Edge cases, trade-offs and deeper patterns in {}."),
    ];
    let base = slug(&req.skill_id);
    let mut prev = req.skill_id.clone();
    let mut new_skills = Vec::new();
    for (i, (suffix, name, description)) in templates.iter().enumerate() {
        let id = format!("{}-{}", base, suffix);
        let name = name.replace("{}", &req.skill_name);
        if req.existing_skills.iter().any(|s| s == &id || s == &name) {
            prev = id;
            continue;
        }
        new_skills.push(NewSkill {
            id: id.clone(),
            name,
            description: description.replace("{}", &req.skill_name),
            level: req.level + 1 + i as u32,
            prerequisites: vec![prev.clone()],
        });
        prev = id;
    }
    SkillTreeExpansion { new_skills }
}
