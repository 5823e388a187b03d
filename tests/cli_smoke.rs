use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

const SCRIPT: &str = "[Script Info]\nTitle: smoke\n\n[Events]\n\
Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n\
Dialogue: 0,0:00:01.00,0:00:04.00,Default,,0,0,0,,{\\kf30}私{\\kf12}は{\\kf20}夢\n\
Dialogue: 0,0:00:05.00,0:00:06.00,Default,,0,0,0,,no karaoke here\n";

#[test]
fn mark_writes_furigana_comments() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let input = dir.path().join("in.ass");
    let output = dir.path().join("out.ass");
    fs::write(&input, SCRIPT)?;

    Command::cargo_bin("karafuri")?
        .arg("mark")
        .arg(&input)
        .arg(&output)
        .args(["--options-json", r#"{"workers": 2, "style": "K1"}"#])
        .assert()
        .success();

    let written = fs::read_to_string(&output)?;
    assert!(written.contains(
        "Comment: 0,0:00:01.00,0:00:04.00,K1,,0,0,0,karaoke,\
         {\\kf10}私|<わ{\\kf10}#|<た{\\kf10}#|<し{\\kf12}は{\\kf10}夢|<ゆ{\\kf10}#|<め"
    ));
    assert!(written.contains("Dialogue: 0,0:00:05.00,0:00:06.00,Default,,0,0,0,,no karaoke here"));
    assert!(written.starts_with("[Script Info]\nTitle: smoke\n"));
    Ok(())
}

#[test]
fn line_uses_precomputed_readings() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let readings = dir.path().join("readings.json");
    fs::write(&readings, r#"{"飢えた": [["飢えた", "まえた"]]}"#)?;

    Command::cargo_bin("karafuri")?
        .args(["line", r"{\kf6}飢{\kf4}え{\kf4}た", "--readings"])
        .arg(&readings)
        .assert()
        .success()
        .stdout(predicate::str::contains(r"{\kf6}飢|<ま{\kf4}え{\kf4}た"));
    Ok(())
}

#[test]
fn line_with_custom_lexicon() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let lexicon = dir.path().join("words.tsv");
    fs::write(&lexicon, "星空\tほしぞら\n")?;

    Command::cargo_bin("karafuri")?
        .args(["line", r"{\k8}星空"])
        .arg("--lexicon")
        .arg(&lexicon)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r"{\k2}星空|<ほ{\k2}#|<し{\k2}#|<ぞ{\k2}#|<ら",
        ));
    Ok(())
}

#[test]
fn missing_input_fails() -> anyhow::Result<()> {
    let dir = tempdir()?;
    Command::cargo_bin("karafuri")?
        .arg("mark")
        .arg(dir.path().join("absent.ass"))
        .arg(dir.path().join("out.ass"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file does not exist"));
    Ok(())
}

#[test]
fn misaligned_readings_report_the_line() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let input = dir.path().join("in.ass");
    let readings = dir.path().join("readings.json");
    fs::write(
        &input,
        "Dialogue: 0,0:00:01.00,0:00:02.00,Default,,0,0,0,,{\\k5}あ{\\k5}いう\n",
    )?;
    fs::write(&readings, r#"{"あいう": [["あい", "アイ"], ["う", "う"]]}"#)?;

    Command::cargo_bin("karafuri")?
        .arg("mark")
        .arg(&input)
        .arg(dir.path().join("out.ass"))
        .arg("--readings")
        .arg(&readings)
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 1"));
    Ok(())
}
