use once_cell::sync::Lazy;
use regex::Regex;

use super::{has_extension, ContentSource, Gate, GateKind};
use crate::rules::{evidence, Predicate, Rule, Subject, Target};
use crate::ToolInput;

const SOURCE_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx", "mjs"];

static ROOT_ROUTE_FILE: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"(^|/)(src/)?app/(layout|page)\.(js|jsx|ts|tsx|mjs)$"));

// Directive must be the first statement; comments and blank lines may precede it
static USE_CLIENT_DIRECTIVE: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| {
    Regex::new(r#"^(?:\s*(?://[^\n]*|/\*(?s:.*?)\*/))*\s*['"]use client['"];?"#)
});

static RULES: &[Rule] = &[
    Rule::block(
        "NX001",
        Predicate::Matches(Target::Path, r"(^|[/\\])pages[/\\]"),
        "The legacy pages/ router directory is not used; put routes under app/ (App Router)",
    ),
    Rule::block(
        "NX002",
        Predicate::Matches(
            Target::Content,
            r"\b(getServerSideProps|getStaticProps|getStaticPaths|getInitialProps)\b",
        ),
        "Pages Router data fetching APIs are deprecated in the App Router; fetch in Server Components or use generateStaticParams",
    ),
    Rule::block(
        "NX003",
        Predicate::Matches(Target::Content, r#"from\s+['"]next/router['"]|require\(\s*['"]next/router['"]\s*\)"#),
        "next/router is the Pages Router API; import from next/navigation instead",
    ),
    Rule::warn(
        "NXW01",
        Predicate::Check(client_directive_in_root_route),
        "Top-level app layout/page is marked 'use client'; keep root routes as Server Components and move interactivity into child components",
    ),
];

pub struct StructureGate;

impl Gate for StructureGate {
    fn kind(&self) -> GateKind {
        GateKind::Structure
    }

    fn applies_to(&self, input: &ToolInput) -> bool {
        has_extension(input, SOURCE_EXTENSIONS)
    }

    fn content_source(&self) -> ContentSource {
        ContentSource::Inline
    }

    fn rules(&self) -> &'static [Rule] {
        RULES
    }
}

fn client_directive_in_root_route(subject: &Subject) -> Option<String> {
    let path = subject.normalized_path()?;
    let content = subject.content.as_deref()?;
    let root = ROOT_ROUTE_FILE.as_ref().ok()?;
    let directive = USE_CLIENT_DIRECTIVE.as_ref().ok()?;
    if root.is_match(&path) && directive.is_match(content) {
        Some(format!("in `{}`", evidence(&path)))
    } else {
        None
    }
}
