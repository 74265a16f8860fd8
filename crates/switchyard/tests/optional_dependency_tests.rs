//! Tests for optional dependencies and zero-value fallback.

use rstest::rstest;
use switchyard::{Container, DiResult, Injectable, Optional};

#[derive(Clone, Debug, Default, PartialEq)]
struct Flags {
	verbose: bool,
	level: u8,
}

impl Injectable for Flags {}

#[derive(Clone, Debug, PartialEq)]
struct Report {
	lines: u32,
}

impl Injectable for Report {}

#[rstest]
fn test_missing_optional_receives_zero_value() {
	let mut container = Container::new();

	container
		.run(|flags: Optional<Flags>| -> DiResult<()> {
			assert_eq!(*flags, Flags::default());
			Ok(())
		})
		.unwrap();
}

#[rstest]
fn test_present_optional_receives_provided_value() {
	let mut container = Container::new();
	container
		.provide(|| Flags {
			verbose: true,
			level: 3,
		})
		.unwrap();

	container
		.run(|flags: Optional<Flags>| -> DiResult<()> {
			assert!(flags.verbose);
			assert_eq!(flags.level, 3);
			Ok(())
		})
		.unwrap();
}

#[rstest]
fn test_optional_in_provider_position() {
	let mut container = Container::new();
	container
		.provide(|flags: Optional<Flags>| Report {
			lines: u32::from(flags.level),
		})
		.unwrap();

	container
		.run(|report: Report| -> DiResult<()> {
			assert_eq!(report.lines, 0);
			Ok(())
		})
		.unwrap();
}

#[rstest]
fn test_required_sibling_still_fails() {
	let mut container = Container::new();

	// An optional input does not make a required one forgiving.
	let error = container
		.run(|_flags: Optional<Flags>, _report: Report| -> DiResult<()> { Ok(()) })
		.unwrap_err();
	assert!(error.to_string().contains("can't resolve type"));
}
