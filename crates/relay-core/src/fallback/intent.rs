//! Rule-based intent matching
//!
//! Deterministic keyword/pattern scoring used when no live provider can
//! classify text. Score = 0.6 * (fraction of keyword groups hit) +
//! 0.4 * (fraction of regex patterns hit); the best intent above its
//! threshold wins, otherwise `general`.

use crate::provider::types::IntentAnalysis;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

const KEYWORD_WEIGHT: f64 = 0.6;
const PATTERN_WEIGHT: f64 = 0.4;

/// One scoreable intent definition
struct IntentRule {
    name: &'static str,
    action: &'static str,
    /// Keyword groups; a group counts as hit when any synonym appears
    keyword_groups: &'static [&'static [&'static str]],
    patterns: Vec<Regex>,
    threshold: f64,
}

fn rule(
    name: &'static str,
    action: &'static str,
    keyword_groups: &'static [&'static [&'static str]],
    patterns: &[&str],
    threshold: f64,
) -> IntentRule {
    IntentRule {
        name,
        action,
        keyword_groups,
        patterns: patterns
            .iter()
            .map(|p| Regex::new(p).expect("static intent pattern"))
            .collect(),
        threshold,
    }
}

const CREATE_VERBS: &[&str] = &["create", "add", "new", "make"];
const LIST_VERBS: &[&str] = &["list", "show", "display", "view", "get"];
const UPDATE_VERBS: &[&str] = &["update", "modify", "change", "edit"];
const DELETE_VERBS: &[&str] = &["delete", "remove", "cancel"];
const TASK_NOUNS: &[&str] = &["task", "tasks"];
const PROJECT_NOUNS: &[&str] = &["project", "projects"];

lazy_static! {
    static ref INTENT_RULES: Vec<IntentRule> = vec![
        rule(
            "create_task",
            "create_task",
            &[CREATE_VERBS, TASK_NOUNS],
            &[r"create.*task", r"add.*task", r"new.*task", r"make.*task"],
            0.6,
        ),
        rule(
            "list_tasks",
            "list_tasks",
            &[LIST_VERBS, TASK_NOUNS],
            &[r"list.*tasks?", r"show.*tasks?", r"view.*tasks?", r"get.*tasks?"],
            0.7,
        ),
        rule(
            "update_task",
            "update_task",
            &[UPDATE_VERBS, TASK_NOUNS],
            &[r"update.*task", r"modify.*task", r"change.*task", r"edit.*task"],
            0.6,
        ),
        rule(
            "delete_task",
            "delete_task",
            &[DELETE_VERBS, TASK_NOUNS],
            &[r"delete.*task", r"remove.*task", r"cancel.*task"],
            0.6,
        ),
        rule(
            "create_project",
            "create_project",
            &[CREATE_VERBS, PROJECT_NOUNS],
            &[r"create.*project", r"add.*project", r"new.*project", r"make.*project"],
            0.6,
        ),
        rule(
            "list_projects",
            "list_projects",
            &[LIST_VERBS, PROJECT_NOUNS],
            &[r"list.*projects?", r"show.*projects?", r"view.*projects?", r"get.*projects?"],
            0.7,
        ),
        rule(
            "help",
            "help_response",
            &[&["help", "how", "what"]],
            &[r"\bhelp\b", r"what.*can.*do", r"how.*work"],
            0.5,
        ),
        rule(
            "status",
            "status_response",
            &[&["status", "health", "working", "available"]],
            &[r"\bstatus\b", r"\bhealth\b", r"\bworking\b", r"\bavailable\b"],
            0.6,
        ),
    ];
    static ref QUOTED_NAME: Regex = Regex::new(r#""([^"]+)""#).expect("static pattern");
}

fn response_templates() -> &'static HashMap<&'static str, Vec<&'static str>> {
    lazy_static! {
        static ref TEMPLATES: HashMap<&'static str, Vec<&'static str>> = {
            let mut t = HashMap::new();
            t.insert("create_task", vec![
                "I understand you want to create a task. The AI service is temporarily limited, so please give me the task title and any details and I will walk you through the next steps.",
                "Happy to help you set up a task. Service capacity is reduced right now; tell me the task name and description and I will help you organize it.",
                "To create a task I need a title and optionally a description. Share those and I will guide you from there.",
            ]);
            t.insert("list_tasks", vec![
                "You want to see your tasks. I cannot reach the task store at the moment; please check the task view directly or try again shortly.",
                "I would show your task list, but connectivity is limited right now. Refreshing the task view or retrying in a moment should work.",
                "Your tasks are not reachable from here right now. Try the task interface directly, or ask me again in a few minutes.",
            ]);
            t.insert("update_task", vec![
                "You want to update a task. Tell me which task and what should change, and I will guide you despite the current service limits.",
                "To modify a task I need its identifier and the change you want. Please provide both and I will help with the steps.",
                "I can help you edit a task. Which task is it, and what needs updating?",
            ]);
            t.insert("delete_task", vec![
                "You want to remove a task. Tell me which one and I will walk you through the deletion even with the current service limits.",
                "To delete a task, please give me its identifier or description and I will guide you through it.",
                "I can help with removing a task. Which task should go?",
            ]);
            t.insert("create_project", vec![
                "You want to create a project. Give me the project name and any details, and I will help you organize it while the AI service recovers.",
                "Happy to set up a project with you. Please share the project name and description and I will guide the setup.",
                "To create a project I need a name and optionally a description. Share those and we can proceed.",
            ]);
            t.insert("list_projects", vec![
                "You want to see your projects. The project store is unreachable from here right now; please check the project view directly.",
                "I would list your projects, but connectivity is limited. Try the main interface or ask again shortly.",
                "Your projects are not reachable at the moment. The project view should still have them.",
            ]);
            t.insert("help", vec![
                "I help with task and project management: creating tasks, listing them, updating details, and organizing projects. What would you like to do?",
                "You can ask me to create, list, update or delete tasks, and to create or list projects. How can I help?",
                "I am your task and project assistant. Ask me to create a task, show your tasks, or set up a project.",
            ]);
            t.insert("status", vec![
                "The AI service is partially degraded right now, but I can still help with basic task and project guidance.",
                "I am running in limited mode due to a service issue. Task and project management guidance still works.",
                "Some AI capabilities are temporarily down. I remain available for task and project questions.",
            ]);
            t.insert("general", vec![
                "I am here to help with task and project management. The AI service is partially limited right now, but tell me what you need and I will do my best.",
                "I may not have my full capabilities at the moment, but I can still help you organize tasks and projects. What do you need?",
                "Service is temporarily limited. I can still offer guidance on tasks and projects; tell me more about your request.",
            ]);
            t
        };
    }
    &TEMPLATES
}

/// Deterministic intent matcher with canned response pools
#[derive(Debug, Default)]
pub struct IntentEngine;

impl IntentEngine {
    pub fn new() -> Self {
        Self
    }

    /// Intent names this engine can recognize
    pub fn supported_intents(&self) -> Vec<&'static str> {
        INTENT_RULES.iter().map(|r| r.name).collect()
    }

    /// Score the text against every intent rule
    pub fn analyze(&self, text: &str) -> IntentAnalysis {
        let lower = text.to_lowercase();
        let mut best: Option<(&IntentRule, f64)> = None;

        for rule in INTENT_RULES.iter() {
            let groups_hit = rule
                .keyword_groups
                .iter()
                .filter(|group| group.iter().any(|kw| lower.contains(kw)))
                .count();
            let keyword_score = groups_hit as f64 / rule.keyword_groups.len() as f64;

            let patterns_hit = rule
                .patterns
                .iter()
                .filter(|p| p.is_match(&lower))
                .count();
            let pattern_score = patterns_hit as f64 / rule.patterns.len() as f64;

            let score = KEYWORD_WEIGHT * keyword_score + PATTERN_WEIGHT * pattern_score;
            if score < rule.threshold {
                continue;
            }
            if best.map(|(_, s)| score > s).unwrap_or(true) {
                best = Some((rule, score));
            }
        }

        match best {
            Some((rule, score)) => IntentAnalysis {
                intent: rule.name.to_string(),
                confidence: score.min(1.0),
                entities: self.extract_entities(text, rule.name),
                action: rule.action.to_string(),
            },
            None => IntentAnalysis::general(),
        }
    }

    /// Heuristic entity extraction: quoted substrings as names, priority words
    fn extract_entities(&self, text: &str, intent: &str) -> HashMap<String, serde_json::Value> {
        let mut entities = HashMap::new();
        let lower = text.to_lowercase();

        match intent {
            "create_task" | "update_task" | "delete_task" => {
                if let Some(cap) = QUOTED_NAME.captures(text) {
                    entities.insert(
                        "task_name".to_string(),
                        serde_json::Value::String(cap[1].to_string()),
                    );
                }
                let priority = if ["high", "urgent", "important"]
                    .iter()
                    .any(|w| lower.contains(w))
                {
                    "high"
                } else if ["low", "minor"].iter().any(|w| lower.contains(w)) {
                    "low"
                } else {
                    "medium"
                };
                entities.insert("priority".to_string(), priority.into());
            }
            "create_project" => {
                if let Some(cap) = QUOTED_NAME.captures(text) {
                    entities.insert(
                        "project_name".to_string(),
                        serde_json::Value::String(cap[1].to_string()),
                    );
                }
            }
            _ => {}
        }

        entities
    }

    /// Pick a canned response for the intent, keyed by confidence band
    ///
    /// Selection within a pool is deterministic on the input text so the
    /// same question gets the same answer.
    pub fn response_for(&self, intent: &str, confidence: f64, text: &str) -> String {
        let templates = response_templates();
        let general = &templates["general"];

        if confidence <= 0.5 {
            return pick(general, text).to_string();
        }

        let pool = templates.get(intent).unwrap_or(general);
        let chosen = pick(pool, text);
        if confidence > 0.8 {
            chosen.to_string()
        } else {
            hedged(chosen)
        }
    }
}

fn pick<'a>(pool: &'a [&'a str], seed: &str) -> &'a str {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    pool[(hasher.finish() as usize) % pool.len()]
}

fn hedged(template: &str) -> String {
    let mut chars = template.chars();
    match chars.next() {
        Some(first) => format!("I think {}{}", first.to_lowercase(), chars.as_str()),
        None => String::new(),
    }
}
