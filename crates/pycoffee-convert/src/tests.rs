use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use expect_test::{Expect, expect, expect_file};
use pycoffee_parse::{Dialect, parse};

use crate::convert;

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
                    let expected = path.with_extension("coffee");
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

    fn dialect(&self) -> Dialect {
        let stem = self.input.file_stem().and_then(|stem| stem.to_str()).unwrap_or_default();
        if stem.starts_with("py2_") { Dialect::new(2, 7) } else { Dialect::default() }
    }
}

#[test]
fn convert_test_data() {
    let test_cases = TestCase::list();
    assert!(!test_cases.is_empty());

    for case in test_cases {
        let parse = parse(&case.text, case.dialect());
        assert!(!parse.has_errors(), "{}: {:?}", case.input.display(), parse.diagnostics());

        let (tree, _) = parse.into_parts();
        let conversion = convert(tree)
            .unwrap_or_else(|err| panic!("{}: {err}", case.input.display()));
        expect_file![&case.expected].assert_eq(&conversion.text);
    }
}

fn render(input: &str, dialect: Dialect) -> String {
    let parse = parse(input, dialect);
    assert!(!parse.has_errors(), "{input:?}: {:?}", parse.diagnostics());

    let (tree, _) = parse.into_parts();
    let conversion = match convert(tree) {
        Ok(conversion) => conversion,
        Err(err) => return format!("error: {err}\n"),
    };
    let mut actual = conversion.text;
    for diagnostic in &conversion.diagnostics {
        _ = writeln!(actual, "{} {}", diagnostic.severity(), diagnostic.message());
    }
    actual
}

#[track_caller]
fn check(input: &str, expect: Expect) {
    expect.assert_eq(&render(input, Dialect::default()));
}

#[track_caller]
fn check_py2(input: &str, expect: Expect) {
    expect.assert_eq(&render(input, Dialect::new(2, 7)));
}

#[test]
fn range_with_step_in_inline_loop() {
    check(
        "for item in range(2, 17, 3): print(item)\n",
        expect![[r#"
            for item in [2...17] by 3 then console.log(item)
        "#]],
    );
}

#[test]
fn format_becomes_interpolation() {
    check(
        "print(\"Hello {}\".format(name))\n",
        expect![[r#"
            console.log("Hello #{name}")
        "#]],
    );
}

#[test]
fn method_with_receiver() {
    check(
        "class Greeter:\n    def greet(self, other):\n        return self.name + other\n",
        expect![[r#"
            class Greeter
                greet: (other) =>
                    @name + other
        "#]],
    );
}

#[test]
fn keyword_argument_is_reported_once() {
    check(
        "f(a, key=1)\n",
        expect![[r#"
            f(a, key=1)
            WARN unsupported keyword argument(s) `key` in call to `f`
        "#]],
    );
}

#[test]
fn print_statement() {
    check_py2(
        "print \"x\", y\nprint\n",
        expect![[r#"
            console.log "x", y
            console.log()
        "#]],
    );
}

#[test]
fn conditional_expression() {
    check(
        "x = a if b else c\n",
        expect![[r#"
            x = if b then a else c
        "#]],
    );
}

#[test]
fn negated_and_infinite_loops() {
    check(
        "while not done: step()\nwhile True:\n    pass\n",
        expect![[r#"
            until done then step()
            loop
                null
        "#]],
    );
}

#[test]
fn inline_branches() {
    check(
        "if a: x = 1\nelif b: x = 2\nelse: x = 3\n",
        expect![[r#"
            if a then x = 1
            else if b then x = 2
            else x = 3
        "#]],
    );
}

#[test]
fn tuples_and_lambdas() {
    check(
        "pairs = [(1, 2), ()]\nf = lambda x, y: x + y\ng = lambda: None\n",
        expect![[r#"
            pairs = [[1, 2], []]
            f = (x, y) -> x + y
            g = -> null
        "#]],
    );
}

#[test]
fn function_without_return_value() {
    check(
        "def add(a, b=1):\n    total = a + b\n",
        expect![[r#"
            add = (a, b=1) ->
                total = a + b
                null
        "#]],
    );
}

#[test]
fn nested_function_in_method_binds_this() {
    check(
        "class A:\n    def run(self):\n        def helper():\n            return self.x\n        return helper\n",
        expect![[r#"
            class A
                run: =>
                    helper = =>
                        @x
                    helper
        "#]],
    );
}

#[test]
fn try_with_filtered_handler() {
    check(
        "try:\n    risky()\nexcept ValueError as err:\n    handle(err)\nfinally:\n    cleanup()\n",
        expect![[r#"
            try
                risky()
            catch err
                handle(err)
            finally
                cleanup()
            WARN exception filter `ValueError` is dropped, every error is caught
        "#]],
    );
}

#[test]
fn slices() {
    check(
        "y = items[1:-1]\nz = items[::2]\nw = items[:]\n",
        expect![[r#"
            y = items[1...-1]
            z = items[..]
            w = items[..]
            WARN slice steps have no CoffeeScript analog, the step is dropped
        "#]],
    );
}

#[test]
fn regexp_substitution() {
    check(
        "s = re.sub(r'(\\w+)@', r'\\1 at ', text, flags=re.I)\n",
        expect![[r#"
            s = text.replace(/(\w+)@/ig, '$1 at ')
        "#]],
    );
}

#[test]
fn extend_becomes_push() {
    check(
        "items.extend([1, 2])\nitems.extend(more)\n",
        expect![[r#"
            items.push(1, 2)
            items.push(...more)
        "#]],
    );
}

#[test]
fn builtins() {
    check(
        "n = len(xs) + int(s)\nt = str(5)\nk = isinstance(a, B)\n",
        expect![[r#"
            n = xs.length + parseInt(s)
            t = (5).toString()
            k = a instanceof B
        "#]],
    );
}

#[test]
fn dict_display() {
    check(
        "d = {'a': 1, key: 2, **rest}\n",
        expect![[r#"
            d = {'a': 1, [key]: 2, rest...}
        "#]],
    );
}

#[test]
fn list_comprehension() {
    check(
        "evens = [x * 2 for x in nums if x % 2 == 0]\n",
        expect![[r#"
            evens = (x * 2 for x in nums when x % 2 == 0)
        "#]],
    );
}

#[test]
fn simple_statements() {
    check(
        "assert x, \"msg\"\ndel a[0], b\nraise ValueError(\"bad\")\n",
        expect![[r#"
            console.assert x, "msg"
            delete a[0]; delete b
            throw ValueError("bad")
        "#]],
    );
}

#[test]
fn imports_are_commented_out() {
    check(
        "import os\n",
        expect![[r#"
            # import os
            WARN `import` statement has no CoffeeScript analog, commented out
        "#]],
    );
}

#[test]
fn with_statement_scopes_names() {
    check(
        "with open(p) as f:\n    data = f.read()\n",
        expect![[r#"
            do (f = open(p)) ->
                data = f.read()
            WARN `with` does not enter or exit context managers in CoffeeScript
        "#]],
    );
}

#[test]
fn formatted_string() {
    check(
        "msg = f\"{name}!\"\n",
        expect![[r##"
            msg = "#{name}!"
        "##]],
    );
}

#[test]
fn formatted_string_fields_are_converted() {
    check(
        "class A:\n    def m(self):\n        return f'{self.x} {None}'\n",
        expect![[r##"
            class A
                m: =>
                    "#{@x} #{null}"
        "##]],
    );
}

#[test]
fn special_methods() {
    check(
        "class Point:\n    def __init__(self, x):\n        self.x = x\n    def __str__(self):\n        return 'P'\n",
        expect![[r#"
            class Point
                constructor: (x) ->
                    @x = x
                    null
                toString: =>
                    'P'
        "#]],
    );
}

#[test]
fn splat_parameter_and_returns_in_both_branches() {
    check(
        "def pick(a, *rest):\n    if not a: return rest\n    else: return range(3)\n",
        expect![[r#"
            pick = (a, ...rest) ->
                unless a then rest
                else [0...3]
        "#]],
    );
}

#[test]
fn return_without_else_keeps_its_keyword() {
    check(
        "def check(a):\n    if a:\n        return 1\n",
        expect![[r#"
            check = (a) ->
                if a
                    return 1
                null
        "#]],
    );
}

#[test]
fn ranges_outside_loops() {
    check(
        "a = range(n)\nb = range(1, n)\nc = range(0, n, 2)\n",
        expect![[r#"
            a = [0...n]
            b = [1...n]
            c = (_i for _i in [0...n] by 2)
        "#]],
    );
}

#[test]
fn character_builtins_and_compiled_regexps() {
    check(
        "c = ord(s) + 1\nt = chr(n) + hex(n)\np = re.compile(r'a+', re.I)\n",
        expect![[r#"
            c = s.charCodeAt() + 1
            t = String.fromCharCode(n) + n.toString(16)
            p = /a+/i
        "#]],
    );
}

#[test]
fn unknown_regexp_flags_are_reported() {
    check(
        "p = re.compile('a', flags)\nq = re.compile('b', re.I)\n",
        expect![[r#"
            p = re.compile('a', flags)
            q = /b/i
            WARN unrecognized `re` flags `flags`, not converted
        "#]],
    );
}

#[test]
fn extend_with_comprehension_spreads_it() {
    check(
        "items.extend([x * 2 for x in xs])\n",
        expect![[r#"
            items.push(...(x * 2 for x in xs))
        "#]],
    );
}

#[test]
fn print_keywords_name_print() {
    check(
        "print(x, end='')\n",
        expect![[r#"
            console.log(x, end='')
            WARN unsupported keyword argument(s) `end` in call to `print`
        "#]],
    );
}

#[test]
fn adjacent_strings_are_joined() {
    check(
        "s = 'a''b'\n",
        expect![[r#"
            s = 'a' + 'b'
        "#]],
    );
}

#[test]
fn statements_without_analog_are_commented_out() {
    check(
        "global g\n",
        expect![[r#"
            # global g
            WARN `global` statement has no CoffeeScript analog, commented out
        "#]],
    );
    check(
        "x: int\n",
        expect![[r#"
            # x: int
            WARN annotation without a value declares nothing, commented out
        "#]],
    );
}

#[test]
fn loose_operands_are_parenthesized() {
    check(
        "k = isinstance(-a or b, C)\nm = [x for x in y if p if -a or b]\n",
        expect![[r#"
            k = (-a or b) instanceof C
            m = (x for x in y when p and (-a or b))
        "#]],
    );
}
