use git_linear::branch::{
    sanitize, sanitize_live, sanitize_suffix, BranchNameDraft, MAX_BRANCH_LEN, MAX_SUFFIX_LEN,
};

/// No leading hyphen, allowed characters only, no trailing hyphen, and none
/// of the ref shapes git refuses.
fn is_well_formed(name: &str) -> bool {
    let allowed = |c: char| {
        c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.' | '/')
    };
    let first_ok = name
        .chars()
        .next()
        .map(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .unwrap_or(false);
    !name.is_empty()
        && name.len() <= MAX_BRANCH_LEN
        && first_ok
        && !name.ends_with('-')
        && !name.ends_with('.')
        && !name.ends_with('/')
        && !name.contains("..")
        && !name.contains("//")
        && name
            .split('/')
            .all(|c| !c.starts_with('.') && !c.ends_with(".lock"))
        && name.chars().all(allowed)
}

fn git_accepts(name: &str) -> bool {
    std::process::Command::new("git")
        .args(["check-ref-format", "--branch", name])
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

#[test]
fn sanitize_lowercases_identifier() {
    assert_eq!(sanitize("DEV-123", "foo"), "dev-123-foo");
}

#[test]
fn sanitize_empty_text_returns_identifier() {
    assert_eq!(sanitize("DEV-123", ""), "dev-123");
}

#[test]
fn sanitize_slugifies_title() {
    assert_eq!(sanitize("DEV-1", "Fix Login Bug"), "dev-1-fix-login-bug");
}

#[test]
fn sanitize_removes_special_characters() {
    assert_eq!(sanitize("DEV-1", "Hello! @World#"), "dev-1-hello-world");
    assert_eq!(sanitize("DEV-1", "Fix~Login@Bug"), "dev-1-fixloginbug");
}

#[test]
fn sanitize_removes_emoji_and_unicode() {
    assert_eq!(sanitize("DEV-1", "Fix 🔐 Auth"), "dev-1-fix-auth");
    assert_eq!(sanitize("DEV-1", "Añadir prueba"), "dev-1-aadir-prueba");
}

#[test]
fn sanitize_collapses_hyphens() {
    assert_eq!(sanitize("DEV-1", "a - - b"), "dev-1-a-b");
}

#[test]
fn sanitize_turns_consecutive_dots_into_hyphen() {
    assert_eq!(sanitize("DEV-1", "v1..0"), "dev-1-v1-0");
    assert_eq!(sanitize("DEV-1", "v1....0"), "dev-1-v1-0");
    assert_eq!(sanitize("DEV-1", "v1.-..0"), "dev-1-v1.-0");
}

#[test]
fn sanitize_keeps_ref_characters() {
    assert_eq!(sanitize("DEV-1", "fix_login_bug"), "dev-1-fix_login_bug");
    assert_eq!(sanitize("DEV-1", "v1.0.0"), "dev-1-v1.0.0");
    assert_eq!(sanitize("DEV-1", "feature/login"), "dev-1-feature/login");
}

#[test]
fn sanitize_hardens_slashes_and_dots() {
    assert_eq!(sanitize("DEV-1", "a//b"), "dev-1-a/b");
    assert_eq!(sanitize("DEV-1", "a/.hidden"), "dev-1-a/hidden");
    assert_eq!(sanitize("DEV-1", "release/"), "dev-1-release");
    assert_eq!(sanitize("DEV-1", "version 2."), "dev-1-version-2");
}

#[test]
fn sanitize_trims_text_hyphens_only() {
    assert_eq!(sanitize("DEV-1", "--start and end--"), "dev-1-start-and-end");
}

#[test]
fn sanitize_punctuation_only_title_returns_identifier() {
    assert_eq!(sanitize("DEV-1", "!@#$%"), "dev-1");
    assert_eq!(sanitize("DEV-1", " - - "), "dev-1");
}

#[test]
fn sanitize_truncates_long_titles() {
    let result = sanitize("DEV-123", &"a".repeat(100));
    assert_eq!(result.len(), MAX_BRANCH_LEN);
    assert!(result.starts_with("dev-123-"));
    assert!(!result.ends_with('-'));
}

#[test]
fn sanitize_truncation_drops_dangling_hyphen() {
    // "dev-123-" leaves 24 characters
    let title = "abcdefghijklmnopqrs word more";
    let result = sanitize("DEV-123", title);
    assert_eq!(result, "dev-123-abcdefghijklmnopqrs-word");

    // Here the cut lands right after the hyphen
    let title = "abcdefghijklmnopqrstuvw xyz";
    let result = sanitize("DEV-123", title);
    assert_eq!(result, "dev-123-abcdefghijklmnopqrstuvw");
}

#[test]
fn sanitize_long_identifier_skips_text() {
    let identifier = "X".repeat(40);
    let result = sanitize(&identifier, "some title");
    assert_eq!(result, "x".repeat(32));

    // One character short of the limit leaves no room for "-text"
    let identifier = "y".repeat(31);
    assert_eq!(sanitize(&identifier, "title"), identifier);
}

#[test]
fn sanitize_degenerate_identifiers() {
    assert_eq!(sanitize("", "Fix Bug"), "fix-bug");
    assert_eq!(sanitize("-DEV-1-", "x"), "dev-1-x");
    assert_eq!(sanitize("", ""), "branch");
    assert_eq!(sanitize("🔐", "!!"), "branch");
}

#[test]
fn sanitize_output_is_always_well_formed() {
    let identifiers: Vec<String> = ["DEV-123", "", "ab", "-", "__x__", "ÜBER-1"]
        .iter()
        .map(|s| s.to_string())
        .chain(std::iter::once("A".repeat(50)))
        .collect();
    let texts: Vec<String> = [
        "",
        "Fix Login Bug",
        "a - - b",
        "v1..0",
        "..leading dots",
        "trailing hyphen -",
        "/slash/first",
        "emoji 🎉🎉 only",
        "中文标题",
        "a.b-c_d/e",
        "Update Cargo.lock",
        "package.lock/file.lock",
        "a.lock.lock",
        "lock.lock.",
        ".lock",
        "config.lock-",
    ]
    .iter()
    .map(|s| s.to_string())
    .chain(["x".repeat(200), "word ".repeat(20)])
    .collect();

    for identifier in &identifiers {
        for text in &texts {
            let name = sanitize(identifier, text);
            assert!(
                is_well_formed(&name),
                "sanitize({:?}, {:?}) = {:?}",
                identifier,
                text,
                name
            );
        }
    }
}

#[test]
fn sanitize_strips_lock_component_endings() {
    assert_eq!(sanitize("DEV-1", "Update Cargo.lock"), "dev-1-update-cargo");
    assert_eq!(sanitize("DEV-1", "yarn.lock/fix.lock"), "dev-1-yarn/fix");
    assert_eq!(sanitize("DEV-1", "a.lock.lock"), "dev-1-a");
    assert_eq!(sanitize("DEV-1", "Cargo.lock."), "dev-1-cargo");
    assert_eq!(sanitize("DEV-1", "cargo.lockfile"), "dev-1-cargo.lockfile");
    assert_eq!(sanitize("X.lock", ""), "x");
    assert_eq!(sanitize_suffix("Bump Cargo.lock"), "bump-cargo");
}

#[test]
fn sanitize_strips_lock_exposed_by_truncation() {
    // "dev-123-" leaves 24 characters, which end exactly at ".lock"
    let result = sanitize("DEV-123", "abcdefghijklmnopqrs.lockmore");
    assert_eq!(result, "dev-123-abcdefghijklmnopqrs");
}

#[test]
fn sanitize_output_is_accepted_by_git() {
    let titles = [
        "Update Cargo.lock",
        "Fix Login Bug",
        "v1..0",
        "feature//x/.y",
        "release/",
        "version 2.",
        "yarn.lock/fix.lock",
        "abcdefghijklmnopqrs.lockmore",
        "..dots first",
    ];
    for title in titles {
        for identifier in ["DEV-123", ""] {
            let name = sanitize(identifier, title);
            assert!(git_accepts(&name), "git rejected {:?} from {:?}", name, title);
        }
    }

    let mut draft = BranchNameDraft::new("DEV-9", "");
    for c in "bump cargo.lock".chars() {
        draft.insert(c);
    }
    assert_eq!(draft.suffix(), "bump-cargo.lock");
    assert_eq!(draft.commit(), "dev-9-bump-cargo");
    assert!(git_accepts(&draft.commit()));
}

#[test]
fn sanitize_is_idempotent_on_its_own_suffix() {
    let long = "z".repeat(80);
    for text in ["Fix Login Bug", "v1..0", "a - - b", "feature//x/.y", long.as_str()] {
        let once = sanitize("DEV-1", text);
        let suffix = once.strip_prefix("dev-1-").unwrap_or("");
        assert_eq!(sanitize("DEV-1", suffix), once, "text {:?}", text);

        let cleaned = sanitize_suffix(text);
        assert_eq!(sanitize_suffix(&cleaned), cleaned);
    }
}

#[test]
fn sanitize_live_keeps_trailing_separator() {
    assert_eq!(sanitize_live("Fix "), "fix-");
    assert_eq!(sanitize_live("v1."), "v1.");
    assert_eq!(sanitize_live(" lead"), "lead");
    assert_eq!(sanitize_live("a  b"), "a-b");
    assert_eq!(sanitize_suffix("Fix "), "fix");
}

#[test]
fn draft_starts_from_sanitized_title() {
    let draft = BranchNameDraft::new("GIT-1", "Add tests");
    assert_eq!(draft.prefix(), "git-1");
    assert_eq!(draft.suffix(), "add-tests");
    assert_eq!(draft.cursor(), "add-tests".len());
    assert_eq!(draft.commit(), "git-1-add-tests");
}

#[test]
fn draft_resanitizes_on_every_keystroke() {
    let mut draft = BranchNameDraft::new("DEV-7", "");
    for c in "Fix Login!".chars() {
        draft.insert(c);
    }
    assert_eq!(draft.suffix(), "fix-login");
    assert_eq!(draft.cursor(), draft.suffix().len());

    draft.insert(' ');
    assert_eq!(draft.suffix(), "fix-login-");
    draft.insert(' ');
    assert_eq!(draft.suffix(), "fix-login-");
    assert_eq!(draft.commit(), "dev-7-fix-login");

    draft.insert('🔐');
    assert_eq!(draft.suffix(), "fix-login-");
}

#[test]
fn draft_cursor_editing() {
    let mut draft = BranchNameDraft::new("DEV-7", "abc");
    draft.move_home();
    draft.insert('X');
    assert_eq!(draft.suffix(), "xabc");
    assert_eq!(draft.cursor(), 1);

    draft.move_right();
    draft.backspace();
    assert_eq!(draft.suffix(), "xbc");
    assert_eq!(draft.cursor(), 1);

    draft.delete();
    assert_eq!(draft.suffix(), "xc");

    draft.move_end();
    draft.move_right();
    assert_eq!(draft.cursor(), 2);

    draft.move_home();
    draft.move_left();
    draft.backspace();
    assert_eq!(draft.cursor(), 0);
    assert_eq!(draft.suffix(), "xc");

    draft.clear();
    assert_eq!(draft.suffix(), "");
    assert_eq!(draft.commit(), "dev-7");
}

#[test]
fn draft_leading_separator_is_dropped() {
    let mut draft = BranchNameDraft::new("DEV-7", "abc");
    draft.move_home();
    draft.insert(' ');
    assert_eq!(draft.suffix(), "abc");
    assert_eq!(draft.cursor(), 0);
}

#[test]
fn draft_limits_typed_length() {
    let mut draft = BranchNameDraft::new("DEV-7", "");
    for _ in 0..(MAX_SUFFIX_LEN + 10) {
        draft.insert('a');
    }
    assert_eq!(draft.suffix().len(), MAX_SUFFIX_LEN);
    assert!(draft.commit().len() <= MAX_BRANCH_LEN);
}
