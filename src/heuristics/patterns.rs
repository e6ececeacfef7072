//! Compiled pattern tables for the rule-based scorer
//!
//! Every pattern is case-insensitive and compiled once on first use.

use regex::Regex;
use std::sync::OnceLock;

static VAGUE_VERB: OnceLock<Regex> = OnceLock::new();
static LEARNING_VERB: OnceLock<Regex> = OnceLock::new();
static BROAD_TERM: OnceLock<Regex> = OnceLock::new();
static CONTEXT_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
static DETAIL_INDICATORS: OnceLock<Vec<Regex>> = OnceLock::new();
static FILE_PATH: OnceLock<Regex> = OnceLock::new();
static FILE_NAME: OnceLock<Regex> = OnceLock::new();
static LINE_REFERENCE: OnceLock<Regex> = OnceLock::new();
static HTTP_VERB: OnceLock<Regex> = OnceLock::new();
static TECHNICAL_TERM: OnceLock<Regex> = OnceLock::new();
static REQUIREMENT_PHRASE: OnceLock<Regex> = OnceLock::new();

/// Source text for named technologies, shared by the context and technical-term tables
const TECHNOLOGIES: &str = r"react|vue|angular|svelte|next\.?js|nuxt|node\.?js|node|express|nestjs|django|flask|fastapi|rails|spring|laravel|typescript|javascript|python|rust|golang|java|kotlin|swift|dotnet|postgres(?:ql)?|mysql|sqlite|mongodb|mongo|redis|elasticsearch|docker|kubernetes|k8s|aws|gcp|azure|terraform|graphql|grpc|webpack|vite|jest|pytest|tailwind|git|github|gitlab|linux|nginx|kafka|rabbitmq|prisma|sqlalchemy|pandas|numpy|pytorch|tensorflow";

/// Technologies whose names start or end with a symbol, so `\b` can't anchor them
const SYMBOL_TECHNOLOGIES: &str = r"c\+\+|c#|\.net";

/// Source text for technical nouns that pin a prompt to concrete code
const TECHNICAL_NOUNS: &str = r"functions?|methods?|class(?:es)?|components?|endpoints?|routes?|modules?|variables?|hooks?|queries|query|schemas?|tables?|columns?|unit tests?|test suite|tests?|exceptions?|stack ?trace|traceback|typeerror|referenceerror|syntaxerror|valueerror|keyerror|nullpointerexception|segfault|regex|loops?|arrays?|structs?|interfaces?|migrations?|dependenc(?:y|ies)|packages?|librar(?:y|ies)|scripts?|handlers?|middleware|controllers?|parameters?|arguments?|fields?|callbacks?|promises?|compiler|linter|pipeline|workflow|container|cli|repository|branch|commit";

fn build(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid regex")
}

/// Generic action verbs that say nothing about the target
pub fn vague_verb() -> &'static Regex {
    VAGUE_VERB.get_or_init(|| build(r"(?i)\b(make|create|do|fix|help|change|update|build)\b"))
}

/// Verbs that ask for an explanation rather than a change
pub fn learning_verb() -> &'static Regex {
    LEARNING_VERB.get_or_init(|| build(r"(?i)\b(show|tell|teach|explain|learn|understand)\b"))
}

/// Targets that are too large to act on without further detail
pub fn broad_term() -> &'static Regex {
    BROAD_TERM.get_or_init(|| {
        build(r"(?i)\b(website|app|application|system|project|api|database)\b")
    })
}

/// Any match means the prompt carries some concrete context
pub fn context_patterns() -> &'static [Regex] {
    CONTEXT_PATTERNS.get_or_init(|| {
        vec![
            file_path().clone(),
            file_name().clone(),
            build(&format!(
                r"(?i)\b(?:{TECHNOLOGIES})\b|(?:^|[^\w])(?:{SYMBOL_TECHNOLOGIES})"
            )),
            build(&format!(r"(?i)\b(?:{TECHNICAL_NOUNS})\b")),
            build(
                r"(?i)\b(certifi(?:ed|cation)|exam|ccna|comptia|pmp|cka|ckad|solutions architect|data structures|algorithms?|machine learning|design patterns?|big[- ]o|recursion|closures?|ownership|borrow checker|concurrency)\b",
            ),
        ]
    })
}

/// Signals that a broad request still carries specific details
pub fn detail_indicators() -> &'static [Regex] {
    DETAIL_INDICATORS.get_or_init(|| {
        vec![
            build(r"(?i)\b(function|class|method|route|endpoint)s?\b"),
            http_verb().clone(),
            build(
                r"(?i)\b(async|await|auth\w*|login|logout|jwt|oauth|sql|quer(?:y|ies)|schema|table|index|migration|transaction|postgres\w*|mysql|mongo\w*|redis)\b",
            ),
            build(r"\{[^{}]*\}"),
        ]
    })
}

/// Path-like references such as `src/auth/login.ts` or `./config/`
pub fn file_path() -> &'static Regex {
    FILE_PATH.get_or_init(|| {
        build(
            r"(?i)(?:[\w.-]*[/\\][\w.\\/-]*\.[a-z0-9]{1,5}\b|(?:^|\s|[(`'])(?:\./|\.\./|~/|/)?(?:src|lib|app|tests?|components|pages|api|config|scripts|packages|docs|bin|cmd|internal|pkg)/[\w./-]*)",
        )
    })
}

/// Bare filenames with a known source or config extension
pub fn file_name() -> &'static Regex {
    FILE_NAME.get_or_init(|| {
        build(
            r"(?i)\b[\w-]+\.(tsx?|jsx?|mjs|py|rs|go|java|kt|rb|php|cs|cpp|cc|hpp|h|c|swift|json|ya?ml|toml|md|html|css|scss|sql|sh|env|lock|xml|vue|svelte|gradle|ini|cfg)\b",
        )
    })
}

/// References to a line or a `file:line` location
pub fn line_reference() -> &'static Regex {
    LINE_REFERENCE.get_or_init(|| build(r"(?i)(\blines?\s*#?\d+|\bl\d+\b|\.[a-z]{1,5}:\d+)"))
}

/// HTTP verbs used as verbs on a route, not as English words
pub fn http_verb() -> &'static Regex {
    HTTP_VERB.get_or_init(|| {
        build(
            r"(?i)(\b(get|post|put|patch|delete|head|options)\s+(/[\w/{}:.-]*|https?://\S+|requests?\b|endpoints?\b|routes?\b|calls?\b|handlers?\b)|\bhttp\s+(get|post|put|patch|delete)\b)",
        )
    })
}

/// Named technologies and technical nouns, counted for specificity
pub fn technical_term() -> &'static Regex {
    TECHNICAL_TERM.get_or_init(|| {
        build(&format!(
            r"(?i)\b((?:{TECHNOLOGIES})|(?:{TECHNICAL_NOUNS})|async|await|try/catch|json|yaml|sql|html|css|oauth|jwt|cors|csrf|webhook|cache|index)\b|(?:^|[^\w])({SYMBOL_TECHNOLOGIES})"
        ))
    })
}

/// Requirement and constraint phrasing
pub fn requirement_phrase() -> &'static Regex {
    REQUIREMENT_PHRASE.get_or_init(|| {
        build(
            r"(?i)\b(should|must|needs? to|so that|instead of|without|ensure|expected|returns?|validat\w*|at least|at most|no more than|under \d+|within \d+|handle|edge cases?|backwards? compatible|display)\b",
        )
    })
}

/// Whether any pattern in the set matches
pub fn any_match(patterns: &[Regex], text: &str) -> bool {
    patterns.iter().any(|p| p.is_match(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vague_verb_word_boundary() {
        assert!(vague_verb().is_match("please fix it"));
        assert!(vague_verb().is_match("MAKE something"));
        assert!(!vague_verb().is_match("the prefix is wrong"));
        assert!(!vague_verb().is_match("doing nothing"));
    }

    #[test]
    fn test_file_references() {
        assert!(file_path().is_match("see src/auth/login.ts"));
        assert!(file_path().is_match("under ./config/"));
        assert!(file_name().is_match("edit Cargo.toml please"));
        assert!(line_reference().is_match("on line 42"));
        assert!(line_reference().is_match("at login.ts:42"));
        assert!(!file_name().is_match("make it nicer"));
    }

    #[test]
    fn test_http_verb_needs_route_context() {
        assert!(http_verb().is_match("add a POST /users endpoint"));
        assert!(http_verb().is_match("send an http get"));
        assert!(!http_verb().is_match("get better at cooking"));
    }

    #[test]
    fn test_technologies_match_with_punctuation() {
        let tech = technical_term();
        assert!(tech.is_match("use c++ here"));
        assert!(tech.is_match("a next.js page"));
        assert!(tech.is_match("React hooks"));
    }

    #[test]
    fn test_context_patterns() {
        assert!(any_match(context_patterns(), "explain recursion"));
        assert!(any_match(context_patterns(), "write a python script"));
        assert!(!any_match(context_patterns(), "make something"));
        assert!(!any_match(context_patterns(), "help me with my website"));
    }
}
