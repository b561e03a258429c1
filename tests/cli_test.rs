//! Tests for command dispatch and exit codes

use std::fs;

use clap::Parser;
use rstest::rstest;
use tempfile::TempDir;

use sozi::cli::args::Cli;
use sozi::cli::commands::execute_command;
use sozi::exitcode;

const DRAWING: &str = r#"<svg xmlns="http://www.w3.org/2000/svg"><rect/><g id="A"/></svg>"#;

fn run(args: &[&str]) -> Result<(), i32> {
    let cli = Cli::try_parse_from(std::iter::once("sozi").chain(args.iter().copied()))
        .expect("valid arguments");
    execute_command(&cli).map_err(|e| e.exit_code())
}

#[test]
fn given_document_when_normalizing_to_file_then_written() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("talk.svg");
    let output = temp.path().join("out/talk.svg");
    fs::write(&input, DRAWING).unwrap();

    run(&[
        "normalize",
        input.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
    ])
    .unwrap();

    let written = fs::read_to_string(&output).unwrap();
    assert!(written.contains(r#"<g id="sozi-wrapper-0-0"><rect/></g><g id="A"/>"#));
}

#[test]
fn given_local_config_when_normalizing_then_prefix_applied() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("talk.svg");
    let output = temp.path().join("talk.out.svg");
    fs::write(&input, DRAWING).unwrap();
    fs::write(
        temp.path().join(".sozi.toml"),
        "[layers]\nwrapper_prefix = \"loose\"\n",
    )
    .unwrap();

    run(&[
        "normalize",
        input.to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
    ])
    .unwrap();

    let written = fs::read_to_string(&output).unwrap();
    assert!(written.contains(r#"<g id="loose-0-0">"#));
}

#[rstest]
#[case::layers("layers")]
#[case::tree("tree")]
#[case::export("export")]
fn given_document_when_inspecting_then_succeeds(#[case] command: &str) {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("talk.svg");
    fs::write(&input, DRAWING).unwrap();

    assert_eq!(run(&[command, input.to_str().unwrap()]), Ok(()));
}

#[test]
fn given_missing_document_when_listing_layers_then_io_exit_code() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("absent.svg");

    assert_eq!(
        run(&["layers", input.to_str().unwrap()]),
        Err(exitcode::IOERR)
    );
}

#[test]
fn given_html_document_when_listing_layers_then_data_exit_code() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("page.svg");
    fs::write(&input, "<html/>").unwrap();

    assert_eq!(
        run(&["layers", input.to_str().unwrap()]),
        Err(exitcode::DATAERR)
    );
}

#[test]
fn given_broken_local_config_when_listing_layers_then_config_exit_code() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("talk.svg");
    fs::write(&input, DRAWING).unwrap();
    fs::write(temp.path().join(".sozi.toml"), "[layers").unwrap();

    assert_eq!(
        run(&["layers", input.to_str().unwrap()]),
        Err(exitcode::CONFIG)
    );
}

#[test]
fn given_config_dir_when_init_then_template_created_once() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().to_str().unwrap();

    run(&["-C", dir, "config", "init"]).unwrap();
    let second = run(&["-C", dir, "config", "init"]);

    let content = fs::read_to_string(temp.path().join(".sozi.toml")).unwrap();
    assert!(content.contains("[layers]"));
    assert_eq!(second, Err(exitcode::USAGE));
}

#[test]
fn given_no_command_when_executing_then_usage_exit_code() {
    assert_eq!(run(&[]), Err(exitcode::USAGE));
}
