use pycoffee_db::{Diagnostic, Dialect, File, RootDatabase, convert_file, diagnostics};

#[derive(Debug, PartialEq, Eq)]
struct ExpectedDiag {
    line: usize,
    severity: String,
    message: String,
}

#[derive(Debug, PartialEq, Eq)]
struct ActualDiag {
    line: usize,
    severity: String,
    message: String,
}

/// Reads `#~ WARN message` and `#~ ERROR message` annotations.
fn parse_expectations(fixture: &str) -> Vec<ExpectedDiag> {
    let mut expected = Vec::new();

    for (idx, line) in fixture.lines().enumerate() {
        let Some((_, comment)) = line.split_once("#~") else {
            continue;
        };
        let comment = comment.trim();
        let Some((severity, message)) = comment.split_once(' ') else {
            continue;
        };
        expected.push(ExpectedDiag {
            line: idx + 1,
            severity: severity.to_owned(),
            message: message.trim().to_owned(),
        });
    }

    expected
}

fn collect_actual(db: &RootDatabase, file: File, diagnostics: &[Diagnostic]) -> Vec<ActualDiag> {
    let line_index = file.line_index(db);
    let mut actual = diagnostics
        .iter()
        .map(|diag| {
            let line = line_index.line_col(diag.range().start()).line as usize + 1;
            ActualDiag {
                line,
                severity: diag.severity().to_string(),
                message: diag.message().to_owned(),
            }
        })
        .collect::<Vec<_>>();
    actual.sort_by_key(|diag| (diag.line, diag.message.clone()));
    actual
}

#[track_caller]
fn check_with(fixture: &str, dialect: Dialect) -> Option<String> {
    let db = RootDatabase::default();
    let file = File::new(&db, "fixture.py".into(), fixture.to_owned(), dialect);

    let output = convert_file(&db, file);
    let diagnostics = diagnostics(&db, file);
    let mut actual = collect_actual(&db, file, &diagnostics);
    let mut expected = parse_expectations(fixture);

    expected.sort_by_key(|diag| (diag.line, diag.message.clone()));

    assert_eq!(
        expected.len(),
        actual.len(),
        "expected {} diagnostic(s), got {}\nexpected: {expected:#?}\nactual: {actual:#?}",
        expected.len(),
        actual.len(),
    );

    for expected_diag in expected {
        let Some(pos) = actual.iter().position(|diag| {
            diag.line == expected_diag.line
                && diag.severity == expected_diag.severity
                && diag.message.contains(&expected_diag.message)
        }) else {
            panic!(
                "missing {} on line {} containing `{}`\nactual: {actual:#?}",
                expected_diag.severity, expected_diag.line, expected_diag.message
            );
        };
        actual.remove(pos);
    }

    assert!(actual.is_empty(), "unexpected diagnostics:\n{actual:#?}");
    output
}

#[track_caller]
fn check(fixture: &str) -> Option<String> {
    check_with(fixture, Dialect::default())
}

#[test]
fn clean_file_has_no_diagnostics() {
    let output = check(
        r#"
def greet(name):
    return "Hello {}".format(name)
"#,
    );
    assert_eq!(output.as_deref(), Some("\ngreet = (name) ->\n    \"Hello #{name}\"\n"));
}

#[test]
fn keyword_arguments() {
    check(
        r#"
sorted(items, key=len) #~ WARN unsupported keyword argument(s) `key` in call to `sorted`
"#,
    );
}

#[test]
fn double_splat_parameter() {
    check(
        r#"
def f(a, **options): #~ WARN no analog of `**kwargs` parameters
    return a
"#,
    );
}

#[test]
fn decorators_and_imports() {
    check(
        r#"
import os #~ WARN `import` statement has no CoffeeScript analog
@cached #~ WARN decorator `@cached` is not applied
def load():
    pass
"#,
    );
}

#[test]
fn exception_handling() {
    check(
        r#"
try:
    run()
except KeyError: #~ WARN exception filter `KeyError` is dropped
    pass
except: #~ WARN CoffeeScript has a single `catch`
    pass
else: #~ WARN `else` clause of `try` has no CoffeeScript analog
    done()
"#,
    );
}

#[test]
fn regexp_flags() {
    check(
        r#"
pattern = re.compile(r'\d+', re.I | re.L) #~ WARN regex flag `L` has no JavaScript analog
"#,
    );
}

#[test]
fn python2_statements() {
    check_with(
        r#"
print >>log, "x" #~ WARN `print >>file` writes to the console instead
print "y", #~ WARN trailing comma suppressing the newline
exec code #~ WARN `exec` becomes `eval`
"#,
        Dialect::new(2, 7),
    );
}

#[test]
fn syntax_errors_are_reported_and_converted() {
    let output = check(
        r#"
x = ) #~ ERROR expected expression
"#,
    );
    assert!(output.is_some());
}

#[test]
fn changed_text_is_converted_again() {
    use salsa::Setter as _;

    let mut db = RootDatabase::default();
    let file = File::new(&db, "edit.py".into(), "x = None\n".to_owned(), Dialect::default());
    assert_eq!(convert_file(&db, file).as_deref(), Some("x = null\n"));

    file.set_text(&mut db).to("x = True\n".to_owned());
    assert_eq!(convert_file(&db, file).as_deref(), Some("x = true\n"));
    assert!(diagnostics(&db, file).is_empty());
}
