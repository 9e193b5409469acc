// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::integration::consistency::release_fixture;

use anyhow::Result;
use indoc::indoc;
use pretty_assertions::assert_eq;
use sealed_test::prelude::*;
use std::{
    fs::{read_to_string, write},
    process::{Command, Output},
};

fn md5tool(args: &[&str]) -> Result<Output> {
    Ok(Command::new(env!("CARGO_BIN_EXE_md5tool"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()?)
}

fn revtool(args: &[&str]) -> Result<Output> {
    Ok(Command::new(env!("CARGO_BIN_EXE_revtool"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()?)
}

#[sealed_test]
fn md5tool_without_mode_prints_usage() -> Result<()> {
    let output = md5tool(&[])?;
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8(output.stdout)?.contains("Usage:"));

    Ok(())
}

#[sealed_test]
fn md5tool_rejects_both_modes() -> Result<()> {
    let output = md5tool(&["-g", "-c"])?;
    assert!(!output.status.success());

    Ok(())
}

#[sealed_test]
fn md5tool_usage_error_goes_to_stdout() -> Result<()> {
    let output = md5tool(&["--bogus"])?;
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8(output.stdout)?.contains("Usage:"));

    let output = md5tool(&["-g", "-c"])?;
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8(output.stdout)?.contains("Usage:"));

    Ok(())
}

#[sealed_test]
fn md5tool_detects_corruption() -> Result<()> {
    write("a.rpm", "X")?;
    write("b.rpm", "Y")?;

    let output = md5tool(&["-g"])?;
    assert!(output.status.success());
    let expect = indoc! {"
        |02129bb861061d1a052c592e2dc6b383 a.rpm|
        |57cec4137b614c87cb4e24a3d003a3e0 b.rpm|
    "};
    assert_eq!(String::from_utf8(output.stdout)?, expect);
    assert_eq!(read_to_string("md5.txt")?, expect);

    let output = md5tool(&["-c"])?;
    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout)?, "OK a.rpm\nOK b.rpm\n");

    write("b.rpm", "Z")?;
    let output = md5tool(&["-c"])?;
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        String::from_utf8(output.stdout)?,
        "OK a.rpm\nMISMATCH b.rpm (actual 21c2e59531c8710156d34a3c30ac81d5 expected 57cec4137b614c87cb4e24a3d003a3e0)\n"
    );

    Ok(())
}

#[sealed_test]
fn md5tool_check_without_manifest_fails() -> Result<()> {
    let output = md5tool(&["-c"])?;
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());

    Ok(())
}

#[sealed_test]
fn revtool_exit_status_follows_violations() -> Result<()> {
    release_fixture(".")?;
    write(
        "revtool.toml",
        indoc! {r#"
            [[unit]]
            name = "logger"

            [[unit]]
            name = "imaging"
        "#},
    )?;

    let output = revtool(&[])?;
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        String::from_utf8(output.stdout)?,
        "imaging has changes but no version bump in imaging/CMakeLists.txt\n"
    );

    let output = revtool(&["logger", "recorder"])?;
    assert_eq!(output.status.code(), Some(0));
    assert!(output.stdout.is_empty());

    Ok(())
}

#[sealed_test]
fn revtool_named_unit_keeps_configured_manifest() -> Result<()> {
    release_fixture(".")?;
    write(
        "revtool.toml",
        indoc! {r#"
            [[unit]]
            name = "drivers/kmod"
            manifest = "logger/CMakeLists.txt"
        "#},
    )?;

    let output = revtool(&["drivers/kmod"])?;
    assert_eq!(output.status.code(), Some(0));
    assert!(output.stdout.is_empty());

    let output = revtool(&["./imaging"])?;
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        String::from_utf8(output.stdout)?,
        "imaging has changes but no version bump in imaging/CMakeLists.txt\n"
    );

    Ok(())
}

#[sealed_test(env = [("XDG_CONFIG_HOME", "/nowhere/config")])]
fn revtool_without_units_fails() -> Result<()> {
    release_fixture(".")?;
    let output = revtool(&[])?;
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());

    Ok(())
}
