use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use expect_test::expect_file;
use pycoffee_syntax::SyntaxKind;

use crate::{Dialect, parse};

#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct TestCase {
    input: PathBuf,
    expected: PathBuf,
    text: String,
}

impl TestCase {
    fn list() -> Vec<Self> {
        let test_data_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("test_data");

        let mut cases = fs::read_dir(&test_data_dir)
            .unwrap_or_else(|err| {
                panic!("Cannot read directory {}: {err}", test_data_dir.display())
            })
            .filter_map(|entry| {
                let path = entry.ok()?.path();
                if path.extension()? == "py" {
                    let expected = path.with_extension("tree");
                    let text = fs::read_to_string(&path).ok()?;
                    Some(Self { input: path, expected, text })
                } else {
                    None
                }
            })
            .collect::<Vec<_>>();

        cases.sort();
        cases
    }

    /// Files named `py2_*` are parsed as Python 2.7.
    fn dialect(&self) -> Dialect {
        let stem = self.input.file_stem().and_then(|stem| stem.to_str()).unwrap_or_default();
        if stem.starts_with("py2_") { Dialect::new(2, 7) } else { Dialect::default() }
    }
}

#[test]
fn parse_test_data() {
    let test_cases = TestCase::list();
    assert!(!test_cases.is_empty());

    for case in test_cases {
        let parse = parse(&case.text, case.dialect());
        let tree = parse.tree();

        let mut actual = tree.debug_dump(tree.root());
        actual.push_str("Errors:\n");
        for diagnostic in parse.diagnostics() {
            _ = writeln!(actual, "  {}", diagnostic.message());
        }
        expect_file![&case.expected].assert_eq(&actual);

        assert_eq!(tree.text(tree.root()), case.text, "{}", case.input.display());
    }
}

#[test]
fn lossless_on_broken_input() {
    let inputs = [
        "def f(:\n    return\n",
        "x = [1, 2\ny = 3\n",
        "class:\n  pass\n",
        "if x\n    y\n",
        "'unterminated\nz = `w`\n",
        "try:\n    pass\n",
        "f(**)\n\n\n  \tq\n",
        "lambda x, y z: 0\n",
    ];

    for input in inputs {
        let parse = parse(input, Dialect::default());
        assert_eq!(parse.tree().text(parse.tree().root()), input);
        assert!(parse.has_errors(), "expected a syntax error in {input:?}");
    }
}

#[test]
fn valid_input_has_no_errors() {
    let inputs = [
        "async def f(a: int = 1, *, b, **kw) -> str:\n    await g()\n    return f'{a}'\n",
        "with open(p) as f, lock:\n    data = yield from f\n",
        "try:\n    x()\nexcept (A, B) as e:\n    raise C from e\nelse:\n    pass\nfinally:\n    y = {**a, 'k': v}\n",
        "for i, (a, b) in enumerate(zip(xs, ys)):\n    if a is not b and i not in seen: continue\n",
        "from . import (a as b, c,)\nimport os.path, sys as s\nglobal g; nonlocal n\n",
        "x: int\nx += 1\n*a, b = c\ndel a[0], b.c\nassert x, 'message'\n",
        "s = {x for x in y}\nd = {k: v for k, v in items}\ng = (z async for z in q)\n",
        "f = lambda *a, **k: a[1:-1:2]\nn = not -x ** ~y // 3 @ m << 1 | 2 ^ 3 & 4\n",
        "@decorator.attr(arg)\n@other\nclass C(Base, metaclass=M):\n    '''doc'''\n    ...\n",
        "while (n := next(it)) != 0:\n    pass\nelse:\n    done()\n",
        "a[1:2:3, ::]\r\nb[:]",
    ];

    for input in inputs {
        let parse = parse(input, Dialect::default());
        let messages: Vec<_> = parse.diagnostics().iter().map(|d| d.message()).collect();
        assert!(messages.is_empty(), "{input:?}: {messages:?}");
        assert_eq!(parse.tree().text(parse.tree().root()), input);
    }
}

#[test]
fn python2_statements() {
    let input = "print >>sys.stderr, 'x'\nexec code in ns\nraise E, 'message'\nprint\n";
    let parse = parse(input, Dialect::new(2, 7));
    assert!(parse.diagnostics().is_empty(), "{:?}", parse.diagnostics());

    let tree = parse.tree();
    let kinds: Vec<_> = tree
        .children(tree.root())
        .iter()
        .filter_map(|&stmt| tree.child(stmt, 0))
        .map(|first| tree.kind(first))
        .collect();
    assert_eq!(
        kinds,
        [SyntaxKind::PRINT_STMT, SyntaxKind::EXEC_STMT, SyntaxKind::RAISE_STMT, SyntaxKind::KEYWORD]
    );
}

#[test]
fn error_messages() {
    let cases = [
        ("x = )\n", "expected expression"),
        ("def f(:\n    pass\n", "expected a parameter"),
        ("if x:\ny\n", "expected an indented block"),
        ("try:\n    pass\n", "expected `except` or `finally`"),
        ("s = 'abc\n", "unterminated string literal"),
        ("s = $\n", "unexpected character `$`"),
        ("x = (1, 2\n", "expected `)`"),
    ];

    for (input, message) in cases {
        let parse = parse(input, Dialect::default());
        let first = parse.diagnostics().first().map(|d| d.message());
        assert_eq!(first, Some(message), "{input:?}");
    }
}
