//! Static signal tables used by quality scoring and feed explanations.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// Language-specific technical keywords for the tech-weight signal.
/// Keys match GitHub's `primary_language` names.
pub static TECH_KEYWORDS_BY_LANGUAGE: Lazy<HashMap<&'static str, &'static [&'static str]>> =
    Lazy::new(|| {
        let mut map: HashMap<&'static str, &'static [&'static str]> = HashMap::new();
        map.insert(
            "Python",
            &[
                "TypeError",
                "ImportError",
                "AttributeError",
                "KeyError",
                "ValueError",
                "RuntimeError",
                "asyncio",
                "async",
                "await",
                "FastAPI",
                "Django",
                "Flask",
                "pytest",
                "pip",
                "venv",
                "traceback",
                "Pydantic",
            ][..],
        );
        map.insert(
            "TypeScript",
            &[
                "TypeError",
                "ReferenceError",
                "Promise",
                "async",
                "await",
                "React",
                "Node",
                "ESLint",
                "tsx",
                "interface",
                "type",
                "undefined",
                "null",
                "webpack",
                "Vite",
                "Next.js",
                "Angular",
            ][..],
        );
        map.insert(
            "JavaScript",
            &[
                "TypeError",
                "ReferenceError",
                "Promise",
                "async",
                "await",
                "React",
                "Node",
                "Express",
                "npm",
                "undefined",
                "null",
                "callback",
                "fetch",
                "webpack",
                "Vite",
                "Vue",
            ][..],
        );
        map.insert(
            "Java",
            &[
                "NullPointerException",
                "ClassCastException",
                "IllegalArgumentException",
                "Spring",
                "Maven",
                "Gradle",
                "JUnit",
                "Hibernate",
                "JVM",
                "OutOfMemoryError",
                "StackOverflowError",
                "IOException",
                "thread",
                "synchronized",
            ][..],
        );
        map.insert(
            "Go",
            &[
                "goroutine",
                "channel",
                "panic",
                "defer",
                "context",
                "nil",
                "error",
                "interface",
                "struct",
                "go mod",
                "concurrency",
                "deadlock",
                "race",
            ][..],
        );
        map.insert(
            "Rust",
            &[
                "unwrap",
                "Result",
                "Option",
                "panic",
                "async",
                "tokio",
                "cargo",
                "borrow",
                "lifetime",
                "ownership",
                "unsafe",
                "Send",
                "Sync",
                "Arc",
                "Mutex",
            ][..],
        );
        map.insert(
            "C++",
            &[
                "segfault",
                "nullptr",
                "CMake",
                "template",
                "RAII",
                "memory leak",
                "undefined behavior",
                "std::",
                "vector",
                "pointer",
                "reference",
                "constructor",
                "destructor",
                "SIGSEGV",
            ][..],
        );
        map.insert(
            "C#",
            &[
                "NullReferenceException",
                "ArgumentException",
                "async",
                "await",
                "Task",
                "LINQ",
                "dotnet",
                "Entity Framework",
                "ASP.NET",
                "Unity",
                "garbage collection",
            ][..],
        );
        map.insert(
            "Kotlin",
            &[
                "coroutine",
                "suspend",
                "Flow",
                "Gradle",
                "Spring",
                "null safety",
                "lateinit",
                "by lazy",
                "sealed",
                "data class",
                "Android",
                "Ktor",
            ][..],
        );
        map.insert(
            "SQL",
            &[
                "JOIN",
                "INDEX",
                "deadlock",
                "transaction",
                "query",
                "SELECT",
                "INSERT",
                "UPDATE",
                "DELETE",
                "foreign key",
                "constraint",
                "performance",
                "slow query",
            ][..],
        );
        map
    });

/// Fallback keywords for languages without a dedicated table.
pub const DEFAULT_TECH_KEYWORDS: &[&str] = &[
    "error",
    "bug",
    "crash",
    "exception",
    "fail",
    "issue",
    "problem",
    "traceback",
    "stacktrace",
    "FATAL",
    "CRITICAL",
    "panic",
];

/// Section headers that indicate a structured issue template was filled in.
pub const TEMPLATE_HEADERS: &[&str] = &[
    "## Description",
    "## Steps to Reproduce",
    "## Expected Behavior",
    "## Actual Behavior",
    "## Environment",
    "### Bug Report",
    "### Feature Request",
    "## Reproduction",
    "## Context",
    "### Describe the bug",
    "### To Reproduce",
    "### Expected behavior",
];

/// Low-content phrases that mark an issue body as junk.
pub const JUNK_PATTERNS: &[&str] = &[
    "+1",
    "me too",
    "same issue",
    "same here",
    "bump",
    "any update",
    "any progress",
];

/// Junk phrases compiled as case-insensitive literal matches.
pub static JUNK_REGEXES: Lazy<Vec<Regex>> = Lazy::new(|| {
    JUNK_PATTERNS
        .iter()
        .map(|pattern| {
            Regex::new(&format!("(?i){}", regex::escape(pattern)))
                .expect("escaped literal pattern compiles")
        })
        .collect()
});

/// Languages surfaced in user profiles and feed explanations.
pub const PROFILE_LANGUAGES: &[&str] = &[
    "TypeScript",
    "Python",
    "Java",
    "JavaScript",
    "C++",
    "C#",
    "Go",
    "Rust",
    "Kotlin",
    "SQL",
];

/// Canonical skill names with their lowercase aliases, used to normalize
/// free-form profile topics and resume skills before matching.
static SKILL_TAXONOMY: &[(&str, &[&str])] = &[
    ("Python", &["python", "python3", "py"]),
    ("TypeScript", &["typescript", "ts"]),
    ("JavaScript", &["javascript", "js", "node.js", "nodejs"]),
    ("Java", &["java"]),
    ("Go", &["go", "golang"]),
    ("Rust", &["rust"]),
    ("C++", &["c++", "cpp", "c plus plus"]),
    ("C#", &["c#", "csharp", "c sharp"]),
    ("Kotlin", &["kotlin"]),
    ("SQL", &["sql", "mysql", "postgresql", "postgres"]),
    ("React", &["react", "react.js", "reactjs"]),
    ("Vue", &["vue", "vue.js", "vuejs"]),
    ("Angular", &["angular", "angularjs"]),
    ("Next.js", &["next.js", "nextjs", "next"]),
    ("Svelte", &["svelte", "sveltekit"]),
    ("FastAPI", &["fastapi"]),
    ("Django", &["django"]),
    ("Flask", &["flask"]),
    ("Express", &["express", "express.js", "expressjs"]),
    ("Spring", &["spring", "spring boot", "springboot"]),
    ("PostgreSQL", &["postgresql", "postgres", "psql"]),
    ("MongoDB", &["mongodb", "mongo"]),
    ("Redis", &["redis"]),
    ("Elasticsearch", &["elasticsearch", "elastic"]),
    ("Docker", &["docker"]),
    ("Kubernetes", &["kubernetes", "k8s"]),
    ("Terraform", &["terraform"]),
    ("AWS", &["aws", "amazon web services"]),
    ("GCP", &["gcp", "google cloud", "google cloud platform"]),
    ("Azure", &["azure", "microsoft azure"]),
    ("PyTorch", &["pytorch", "torch"]),
    ("TensorFlow", &["tensorflow", "tf"]),
    ("Pandas", &["pandas"]),
    ("NumPy", &["numpy"]),
    ("scikit-learn", &["scikit-learn", "sklearn"]),
];

/// Normalize a raw skill string to its canonical form, or None if unknown.
pub fn normalize_skill(raw: &str) -> Option<&'static str> {
    let key = raw.trim().to_lowercase();
    if key.is_empty() {
        return None;
    }
    SKILL_TAXONOMY
        .iter()
        .find(|(_, aliases)| aliases.contains(&key.as_str()))
        .map(|(canonical, _)| *canonical)
}
