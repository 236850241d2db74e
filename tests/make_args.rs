use std::collections::BTreeMap;
use std::error::Error;

use buildrun::logger::Logger;
use buildrun::make::Make;
use tempfile::tempdir;

type TestResult = Result<(), Box<dyn Error>>;

fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn quiet_make(dir: &std::path::Path) -> Result<Make, Box<dyn Error>> {
    Ok(Make::new(Logger::to_file(dir.join("build.log"))?))
}

#[test]
fn variables_come_before_targets() -> TestResult {
    let dir = tempdir()?;
    let make = quiet_make(dir.path())?;

    let args = make.render_args(
        &strings(&["build", "test"]),
        &vars(&[("mode", "release"), ("arch", "x86_64")]),
    );
    assert_eq!(args, strings(&["arch=x86_64", "mode=release", "build", "test"]));
    Ok(())
}

#[test]
fn per_call_variables_override_common_ones() -> TestResult {
    let dir = tempdir()?;
    let make = quiet_make(dir.path())?
        .common_variables(vars(&[("mode", "debug"), ("jobs", "4")]));

    let args = make.render_args(&strings(&["all"]), &vars(&[("mode", "release")]));
    assert_eq!(args, strings(&["jobs=4", "mode=release", "all"]));
    Ok(())
}

#[test]
fn empty_targets_and_variables_render_nothing() -> TestResult {
    let dir = tempdir()?;
    let make = quiet_make(dir.path())?;

    let args = make.render_args(&[], &BTreeMap::new());
    assert!(args.is_empty());
    Ok(())
}

#[test]
fn common_variables_apply_without_per_call_ones() -> TestResult {
    let dir = tempdir()?;
    let make = quiet_make(dir.path())?.common_variables(vars(&[("prefix", "/usr")]));

    let args = make.render_args(&strings(&["install"]), &BTreeMap::new());
    assert_eq!(args, strings(&["prefix=/usr", "install"]));
    Ok(())
}
