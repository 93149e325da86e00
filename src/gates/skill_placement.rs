use super::{Gate, GateKind};
use crate::rules::{Predicate, Rule, Target};
use crate::ToolInput;

pub const SKILL_FILE_NAME: &str = "SKILL.md";

static RULES: &[Rule] = &[Rule::block(
    "SKL001",
    Predicate::Missing(
        Target::Path,
        r"(^|[/\\])plugins[/\\][^/\\]+[/\\]skills[/\\][^/\\]+[/\\]SKILL\.md$",
    ),
    "SKILL.md must be placed in plugins/<plugin>/skills/<skill-name>/SKILL.md",
)];

pub struct SkillPlacementGate;

impl Gate for SkillPlacementGate {
    fn kind(&self) -> GateKind {
        GateKind::SkillPlacement
    }

    fn applies_to(&self, input: &ToolInput) -> bool {
        crate::extract_file_path(input)
            .and_then(crate::file_name)
            .map(|name| name == SKILL_FILE_NAME)
            .unwrap_or(false)
    }

    fn rules(&self) -> &'static [Rule] {
        RULES
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::rules::Subject;

    fn check(path: &str) -> Vec<String> {
        let subject = Subject {
            file_path: Some(path.to_string()),
            ..Default::default()
        };
        SkillPlacementGate
            .evaluate(&subject, &Config::default())
            .into_iter()
            .map(|v| v.message)
            .collect()
    }

    #[test]
    fn accepts_the_three_segment_template() {
        assert!(check("plugins/foo/skills/bar/SKILL.md").is_empty());
        assert!(check("/home/dev/market/plugins/foo/skills/bar/SKILL.md").is_empty());
        assert!(check("C:\\market\\plugins\\foo\\skills\\bar\\SKILL.md").is_empty());
    }

    #[test]
    fn rejects_other_locations() {
        for bad in [
            "skills/bar/SKILL.md",
            "plugins/foo/SKILL.md",
            "plugins/foo/skills/SKILL.md",
            "plugins/foo/skills/bar/nested/SKILL.md",
            "plugins/foo/skill/bar/SKILL.md",
            "SKILL.md",
        ] {
            let msgs = check(bad);
            assert_eq!(msgs.len(), 1, "{bad} should be rejected");
            assert!(msgs[0].starts_with("SKILL.md must be placed in plugins/<plugin>/skills/<skill-name>/SKILL.md"));
            assert!(msgs[0].contains(bad));
        }
    }

    #[test]
    fn only_skill_files_are_in_scope() {
        let input = |p: &str| ToolInput {
            file_path: Some(p.to_string()),
            ..Default::default()
        };
        assert!(SkillPlacementGate.applies_to(&input("skills/bar/SKILL.md")));
        assert!(!SkillPlacementGate.applies_to(&input("skills/bar/README.md")));
        assert!(!SkillPlacementGate.applies_to(&input("skills/bar/skill.md")));
        assert!(!SkillPlacementGate.applies_to(&ToolInput::default()));
    }
}
