//! Swift literal rendering and reading for version requirements.

use crate::scan::{Arg, Scanner};
use ether_types::{normalize_version, VersionSpec};
use std::ops::Range;

/// Quote a string as a Swift literal.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Render a requirement as it appears after `url:` in a `.package` call.
pub fn render_requirement(spec: &VersionSpec) -> String {
    match spec {
        VersionSpec::Exact(v) => format!(".exact({})", quote(v)),
        VersionSpec::From(v) => format!("from: {}", quote(v)),
        VersionSpec::UpToNextMajor(v) => format!(".upToNextMajor(from: {})", quote(v)),
        VersionSpec::UpToNextMinor(v) => format!(".upToNextMinor(from: {})", quote(v)),
        VersionSpec::Range {
            lower,
            upper,
            inclusive_upper,
        } => {
            let op = if *inclusive_upper { "..." } else { "..<" };
            format!("{}{}{}", quote(lower), op, quote(upper))
        }
        VersionSpec::Branch(b) => format!(".branch({})", quote(b)),
        VersionSpec::Revision(r) => format!(".revision({})", quote(r)),
    }
}

/// Render a complete dependency entry.
pub fn render_dependency(url: &str, spec: &VersionSpec) -> String {
    format!(".package(url: {}, {})", quote(url), render_requirement(spec))
}

/// Render a per-target dependency on `product`.
///
/// A product whose name differs from its package needs the long form so
/// SwiftPM knows where to find it.
pub fn render_target_dependency(product: &str, package: Option<&str>) -> String {
    match package {
        Some(package) if !package.eq_ignore_ascii_case(product) => {
            format!(".product(name: {}, package: {})", quote(product), quote(package))
        }
        _ => quote(product),
    }
}

/// Read the requirement starting at the first of `args`.
///
/// Returns the requirement and the span of the arguments it occupies.
pub(crate) fn read_requirement(
    scanner: &Scanner<'_>,
    args: &[Arg],
) -> Option<(VersionSpec, Range<usize>)> {
    let first = args.first()?;
    let string = |arg: &Arg| scanner.string_at(arg.value.clone());

    let spec = match first.label.as_deref() {
        Some("from") => VersionSpec::from_version(&string(first)?),
        Some("exact") => VersionSpec::exact(&string(first)?),
        Some("branch") => VersionSpec::Branch(string(first)?),
        Some("revision") => VersionSpec::Revision(string(first)?),
        Some("majorVersion") => return read_legacy(scanner, args),
        Some(_) => return None,
        None => read_unlabeled(scanner, first)?,
    };
    Some((spec, first.span.clone()))
}

fn read_unlabeled(scanner: &Scanner<'_>, arg: &Arg) -> Option<VersionSpec> {
    if let Some(call) = scanner.call_at(arg.span.clone()) {
        let inner = scanner.split_list(call.open, call.close);
        let only = match inner.as_slice() {
            [only] => only,
            _ => return None,
        };
        let value = scanner.string_at(only.value.clone())?;

        return match (call.name.as_str(), only.label.as_deref()) {
            ("exact", None) => Some(VersionSpec::exact(&value)),
            ("branch", None) => Some(VersionSpec::Branch(value)),
            ("revision", None) => Some(VersionSpec::Revision(value)),
            ("upToNextMajor", Some("from")) => Some(VersionSpec::up_to_next_major(&value)),
            ("upToNextMinor", Some("from")) => Some(VersionSpec::up_to_next_minor(&value)),
            _ => None,
        };
    }

    read_range(scanner, arg.span.clone())
}

/// `"1.0.0"..<"2.0.0"` or `"1.0.0"..."1.5.0"`, with any spacing around the
/// operator.
fn read_range(scanner: &Scanner<'_>, span: Range<usize>) -> Option<VersionSpec> {
    let (op, symbol) = ["..<", "..."]
        .into_iter()
        .find_map(|symbol| scanner.find_code(span.clone(), symbol).map(|op| (op, symbol)))?;

    let lower = scanner.string_at(scanner.trim(span.start..op))?;
    let upper = scanner.string_at(scanner.trim(op + symbol.len()..span.end))?;
    VersionSpec::parse_range(&format!("{}{}{}", lower, symbol, upper))
}

/// `majorVersion: 1, minor: 2` from Swift 3 manifests.
fn read_legacy(scanner: &Scanner<'_>, args: &[Arg]) -> Option<(VersionSpec, Range<usize>)> {
    let number = |arg: &Arg| scanner.text(arg.value.clone()).trim().parse::<u64>().ok();

    let major = number(&args[0])?;
    match args.get(1) {
        Some(minor_arg) if minor_arg.label.as_deref() == Some("minor") => {
            let minor = number(minor_arg)?;
            let spec = VersionSpec::UpToNextMinor(format!("{}.{}.0", major, minor));
            Some((spec, args[0].span.start..minor_arg.span.end))
        }
        _ => {
            let spec = VersionSpec::UpToNextMajor(format!("{}.0.0", major));
            Some((spec, args[0].span.clone()))
        }
    }
}

/// Strip quotes and a leading `v` from a version typed on the command line.
pub fn clean_version(input: &str) -> String {
    normalize_version(input.trim().trim_matches('"')).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(src: &str) -> Option<VersionSpec> {
        let wrapped = format!("({})", src);
        let scanner = Scanner::new(&wrapped);
        let args = scanner.split_list(0, wrapped.len() - 1);
        read_requirement(&scanner, &args).map(|(spec, _)| spec)
    }

    #[test]
    fn test_render_table() {
        assert_eq!(
            render_requirement(&VersionSpec::Exact("1.0.0".into())),
            r#".exact("1.0.0")"#
        );
        assert_eq!(
            render_requirement(&VersionSpec::From("1.0.0".into())),
            r#"from: "1.0.0""#
        );
        assert_eq!(
            render_requirement(&VersionSpec::Range {
                lower: "1.0.0".into(),
                upper: "2.0.0".into(),
                inclusive_upper: false
            }),
            r#""1.0.0"..<"2.0.0""#
        );
        assert_eq!(
            render_requirement(&VersionSpec::Branch("main".into())),
            r#".branch("main")"#
        );
    }

    #[test]
    fn test_read_every_rendered_variant() {
        let specs = [
            VersionSpec::Exact("1.2.3".into()),
            VersionSpec::From("1.2.3".into()),
            VersionSpec::UpToNextMajor("1.2.3".into()),
            VersionSpec::UpToNextMinor("1.2.3".into()),
            VersionSpec::Range {
                lower: "1.0.0".into(),
                upper: "2.0.0".into(),
                inclusive_upper: false,
            },
            VersionSpec::Range {
                lower: "1.0.0".into(),
                upper: "1.5.0".into(),
                inclusive_upper: true,
            },
            VersionSpec::Branch("develop".into()),
            VersionSpec::Revision("a1b2c3d".into()),
        ];
        for spec in specs {
            assert_eq!(read(&render_requirement(&spec)), Some(spec));
        }
    }

    #[test]
    fn test_read_labeled_forms() {
        assert_eq!(read(r#"exact: "v2.0.0""#), Some(VersionSpec::Exact("2.0.0".into())));
        assert_eq!(read(r#"branch: "main""#), Some(VersionSpec::Branch("main".into())));
        assert_eq!(
            read(r#"revision: "abc""#),
            Some(VersionSpec::Revision("abc".into()))
        );
        assert_eq!(
            read("majorVersion: 2, minor: 1"),
            Some(VersionSpec::UpToNextMinor("2.1.0".into()))
        );
        assert_eq!(
            read("majorVersion: 3"),
            Some(VersionSpec::UpToNextMajor("3.0.0".into()))
        );
    }

    #[test]
    fn test_read_spaced_ranges() {
        let half_open = VersionSpec::Range {
            lower: "1.0.0".into(),
            upper: "2.0.0".into(),
            inclusive_upper: false,
        };
        assert_eq!(read(r#""1.0.0" ..< "2.0.0""#), Some(half_open.clone()));
        assert_eq!(read("\"1.0.0\"\n        ..<\n        \"2.0.0\""), Some(half_open.clone()));
        assert_eq!(read(r#""1.0.0" /* floor */ ..< "v2.0.0""#), Some(half_open));

        assert_eq!(
            read(r#""1.0.0"   ...   "1.5.0""#),
            Some(VersionSpec::Range {
                lower: "1.0.0".into(),
                upper: "1.5.0".into(),
                inclusive_upper: true,
            })
        );
    }

    #[test]
    fn test_read_rejects_unknown() {
        assert_eq!(read(r#""1...0""#), None);
        assert_eq!(read(r#"lower ..< "2.0.0""#), None);
        assert_eq!(read("path: \"../Local\""), None);
        assert_eq!(read("version"), None);
        assert_eq!(read(r#".exact(someVariable)"#), None);
    }

    #[test]
    fn test_target_dependency_literal() {
        assert_eq!(render_target_dependency("Vapor", Some("vapor")), r#""Vapor""#);
        assert_eq!(render_target_dependency("Vapor", None), r#""Vapor""#);
        assert_eq!(
            render_target_dependency("Logging", Some("swift-log")),
            r#".product(name: "Logging", package: "swift-log")"#
        );
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote(r#"a"b\c"#), r#""a\"b\\c""#);
        assert_eq!(clean_version(" v1.0.0 "), "1.0.0");
    }
}
