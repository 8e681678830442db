#![allow(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use super::*;
use pretty_assertions::assert_eq;

use crate::script;

fn open(languages: &SampleLanguages, language: &Language, text: &str) -> TokenHierarchy<TextDocument> {
    TokenHierarchy::with_providers(TextDocument::new(text), language.clone(), languages.providers())
}

#[test]
fn languages_follow_the_extension_unless_overridden() {
    let languages = SampleLanguages::new().unwrap();
    let options = CommandOptions::default();
    assert_eq!(language_for(&languages, "a.calc", &options).unwrap(), languages.calc);
    assert_eq!(language_for(&languages, "dir/page.tmpl", &options).unwrap(), languages.tmpl);
    assert!(matches!(
        language_for(&languages, "notes.txt", &options),
        Err(CommandError::UnknownLanguage { .. })
    ));

    let forced = CommandOptions {
        language: Some("str".to_owned()),
        ..CommandOptions::default()
    };
    assert_eq!(language_for(&languages, "notes.txt", &forced).unwrap(), languages.strings);
}

#[test]
fn missing_files_are_reported_by_name() {
    let error = read_file("/nonexistent/relex/input.calc").unwrap_err();
    assert_eq!(error.to_string(), "cannot find file '/nonexistent/relex/input.calc'");
}

#[test]
fn dump_nests_embedded_lists() {
    let languages = SampleLanguages::new().unwrap();
    let hierarchy = open(&languages, &languages.calc, "x+\"a\\n\"");
    let mut out = String::new();
    let mut seq = hierarchy.token_sequence().unwrap();
    dump::write_sequence(&mut out, &mut seq, 1);
    let expected = r#"  IDENTIFIER 0+1 "x"
  PLUS 1+1 "+" (flyweight)
  STRING 2+5 "\"a\\n\""
    [text/x-calc/text/x-calc-string]
      TEXT 3+1 "a"
      ESCAPE 4+2 "\\n" (flyweight)
"#;
    assert_eq!(out, expected);
}

#[test]
fn dump_marks_partial_tokens() {
    let languages = SampleLanguages::new().unwrap();
    let hierarchy = open(&languages, &languages.calc, "/* a");
    let mut out = String::new();
    dump::write_sequence(&mut out, &mut hierarchy.token_sequence().unwrap(), 0);
    assert_eq!(out, "COMMENT 0+4 \"/* a\" Start\n");
}

#[test]
fn dump_marks_custom_texts() {
    let languages = SampleLanguages::new().unwrap();
    let hierarchy = open(&languages, &languages.calc, "\"\\u{41}\"");
    let mut out = String::new();
    dump::write_sequence(&mut out, &mut hierarchy.token_sequence().unwrap(), 1);
    let expected = r#"  STRING 0+8 "\"\\u{41}\""
    [text/x-calc/text/x-calc-string]
      UNICODE_ESCAPE 1+6 "A" (custom)
"#;
    assert_eq!(out, expected);
}

#[test]
fn json_dump_lists_every_token() {
    let languages = SampleLanguages::new().unwrap();
    let hierarchy = open(&languages, &languages.calc, "a+\"b\"");
    let json = dump::render_json("a.calc", &hierarchy).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["file"], "a.calc");
    let tokens = value["tokens"].as_array().unwrap();
    assert_eq!(tokens.len(), 4);
    assert_eq!(tokens[2]["id"], "STRING");
    assert_eq!(tokens[3]["path"], "text/x-calc/text/x-calc-string");
    assert_eq!(tokens[3]["offset"], 3);
    assert_eq!(tokens[0]["part"], "Complete");
}

#[test]
fn replay_reports_each_event() {
    let languages = SampleLanguages::new().unwrap();
    let mut hierarchy = open(&languages, &languages.calc, "a+bb");
    let edits = script::parse("1 0 c\n").unwrap();
    let options = CommandOptions {
        check: true,
        ..CommandOptions::default()
    };
    let out = replay::replay(&languages, "a.calc", &mut hierarchy, &edits, &options).unwrap();
    assert_eq!(
        out,
        "edit 1: affected 0..3\n  text/x-calc #0 @0: -2 +2\n1 edits, 3 tokens in 1 lists\n"
    );
}

#[test]
fn replay_json_carries_the_modification() {
    let languages = SampleLanguages::new().unwrap();
    let mut hierarchy = open(&languages, &languages.tmpl, "<% a /* %>x<% */ b %>");
    let edits = script::parse("5 2\n5 0 /*\n").unwrap();
    let options = CommandOptions {
        json: true,
        check: true,
        ..CommandOptions::default()
    };
    let out = replay::replay(&languages, "t.tmpl", &mut hierarchy, &edits, &options).unwrap();
    let events: Vec<serde_json::Value> = out
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["step"], 1);
    assert_eq!(events[0]["modification"]["start"], 5);
    assert_eq!(events[0]["modification"]["old_end"], 7);
    assert_eq!(events[0]["join_cascades"], 1);
    assert_eq!(events[1]["modification"]["new_len"], 2);
    assert_eq!(events[1]["join_cascades"], 1);
}

#[test]
fn replay_rejects_edits_past_the_end() {
    let languages = SampleLanguages::new().unwrap();
    let mut hierarchy = open(&languages, &languages.calc, "ab");
    let edits = script::parse("5 0 x").unwrap();
    let error = replay::replay(&languages, "a.calc", &mut hierarchy, &edits, &CommandOptions::default())
        .unwrap_err();
    assert!(matches!(error, CommandError::Hierarchy { .. }));
}

#[test]
fn check_counts_tokens_lists_and_paths() {
    let languages = SampleLanguages::new().unwrap();
    let mut hierarchy = open(&languages, &languages.tmpl, "<% \"s\" %>x");
    let report = check::check_hierarchy("t.tmpl", &mut hierarchy).unwrap();
    assert_eq!(
        report,
        CheckReport {
            path: "t.tmpl".to_owned(),
            tokens: 8,
            lists: 3,
            language_paths: 3,
        }
    );
}

#[test]
fn report_counts_failures() {
    let results: Vec<Result<u32, CommandError>> = vec![
        Ok(1),
        Err(CommandError::RebuildChanged {
            path: "a".to_owned(),
        }),
        Ok(2),
    ];
    let mut seen = Vec::new();
    let error = report(results, |value| seen.push(value)).unwrap_err();
    assert_eq!(seen, vec![1, 2]);
    assert_eq!(error.to_string(), "1 of 3 files failed");
}
