use wasm_host::{
    host_imports, Engine, Error, ExternKind, Global, Host, HostBindings, Module, Store, Val,
};

#[derive(Default)]
struct Recorder {
    calls: Vec<String>,
}

impl Recorder {
    fn no_params_no_results(&mut self) {
        self.calls.push("env.no_params_no_results".into());
    }

    fn other_no_params_no_results(&mut self) {
        self.calls.push("other.no_params_no_results".into());
    }

    fn one_i32_param_no_results(&mut self, v: i32) {
        self.calls.push(format!("i32 {v}"));
    }

    fn one_i64_param_no_results(&mut self, v: i64) {
        self.calls.push(format!("i64 {v}"));
    }

    fn one_f32_param_no_results(&mut self, v: f32) {
        self.calls.push(format!("f32 {v}"));
    }

    fn one_f64_param_no_results(&mut self, v: f64) {
        self.calls.push(format!("f64 {v}"));
    }

    fn one_param_of_each_type(&mut self, a: i32, b: i64, c: f32, d: f64) {
        self.calls.push(format!("each {a} {b} {c} {d}"));
    }

    fn no_params_one_i32_result(&mut self) -> i32 {
        1
    }

    fn no_params_one_i64_result(&mut self) -> i64 {
        2
    }

    fn no_params_one_f32_result(&mut self) -> f32 {
        3.5
    }

    fn no_params_one_f64_result(&mut self) -> f64 {
        4.25
    }

    fn one_param_and_result_of_each_type(&mut self, a: i32, b: i64, c: f32, d: f64) -> (i32, i64, f32, f64) {
        (a * 2, b * 2, c * 2.0, d * 2.0)
    }
}

host_imports! {
    Recorder {
        func "env" "no_params_no_results" => no_params_no_results,
        func "env" "one_i32_param_no_results" => one_i32_param_no_results,
        func "env" "one_i64_param_no_results" => one_i64_param_no_results,
        func "env" "one_f32_param_no_results" => one_f32_param_no_results,
        func "env" "one_f64_param_no_results" => one_f64_param_no_results,
        func "env" "one_param_of_each_type" => one_param_of_each_type,
        func "env" "no_params_one_i32_result" => no_params_one_i32_result,
        func "env" "no_params_one_i64_result" => no_params_one_i64_result,
        func "env" "no_params_one_f32_result" => no_params_one_f32_result,
        func "env" "no_params_one_f64_result" => no_params_one_f64_result,
        func "env" "one_param_and_result_of_each_type" => one_param_and_result_of_each_type,
        func "other" "no_params_no_results" => other_no_params_no_results,
    }
}

fn function_imports(engine: &Engine) -> wasm_host::Result<Module> {
    Module::from_wat(
        engine,
        "function_imports",
        include_str!("./modules/function_imports.wat"),
    )
}

#[test_log::test]
fn dispatches_to_every_import() -> anyhow::Result<()> {
    let engine = Engine::default();
    let module = function_imports(&engine)?;
    let mut store = Store::new(&engine, Recorder::default())?;
    let instance = module.instantiate(&mut store)?;

    instance.call(&mut store, "call_no_params_no_results", &[])?;
    instance.call(&mut store, "call_one_param_each", &[])?;
    assert_eq!(
        store.host()?.calls,
        [
            "env.no_params_no_results",
            "other.no_params_no_results",
            "i32 1",
            "i64 2",
            "f32 3.5",
            "f64 4.25",
            "each -1 -2 -3.5 -4.25",
        ]
    );

    let sum: f64 = instance.call_typed(&mut store, "sum_results", &[])?;
    assert_eq!(sum, 1.0 + 2.0 + 3.5 + 4.25);

    let echoed: (i32, i64, f32, f64) = instance.call_typed(
        &mut store,
        "echo",
        &[Val::I32(1), Val::I64(2), Val::from(3.0_f32), Val::from(4.0_f64)],
    )?;
    assert_eq!(echoed, (2, 4, 6.0, 8.0));
    Ok(())
}

fn instantiate_err<H: Host>(wat: &str, host: H) -> Error {
    let engine = Engine::default();
    let module = Module::from_wat(&engine, "custom", wat).unwrap();
    let mut store = Store::new(&engine, host).unwrap();
    module.instantiate(&mut store).unwrap_err()
}

fn binding_reason(err: &Error) -> (&str, &str, &str) {
    match err {
        Error::Binding {
            member,
            import,
            reason,
        } => (member.as_str(), import.as_str(), reason.as_str()),
        other => panic!("expected a binding error, got {other:?}"),
    }
}

struct NoParams;

impl NoParams {
    fn f(&mut self) {}
}

host_imports! {
    NoParams {
        func "env" "f" => f,
    }
}

#[test_log::test]
fn parameter_count_mismatch() {
    let err = instantiate_err(r#"(module (import "env" "f" (func (param i32))))"#, NoParams);
    assert_eq!(
        binding_reason(&err),
        (
            "NoParams.f",
            "env.f",
            "parameter mismatch: import requires 1 but the function has 0"
        )
    );
    assert_eq!(
        err.to_string(),
        "unable to bind 'NoParams.f' to WebAssembly import 'env.f': parameter mismatch: import requires 1 but the function has 0"
    );
}

struct WrongParam;

impl WrongParam {
    fn f(&mut self, _a: i32, _b: f32) {}
}

host_imports! {
    WrongParam {
        func "env" "f" => f,
    }
}

#[test_log::test]
fn parameter_type_mismatch_names_the_position() {
    let err = instantiate_err(
        r#"(module (import "env" "f" (func (param i32 f64))))"#,
        WrongParam,
    );
    assert_eq!(
        binding_reason(&err).2,
        "parameter #1 is expected to be of type 'f64'"
    );
}

struct Returns;

impl Returns {
    fn f(&mut self) -> i32 {
        0
    }

    fn pair(&mut self) -> (i32, i64) {
        (0, 0)
    }
}

host_imports! {
    Returns {
        func "env" "f" => f,
        func "env" "pair" => pair,
    }
}

#[test_log::test]
fn result_mismatches() {
    let err = instantiate_err(
        r#"(module (import "env" "f" (func)) (import "env" "pair" (func (result i32 i64))))"#,
        Returns,
    );
    assert_eq!(binding_reason(&err).2, "function must not return a value");

    let err = instantiate_err(
        r#"(module (import "env" "f" (func (result i64))) (import "env" "pair" (func (result i32 i64))))"#,
        Returns,
    );
    assert_eq!(binding_reason(&err).2, "return type is expected to be 'i64'");

    let err = instantiate_err(
        r#"(module (import "env" "f" (func (result i32))) (import "env" "pair" (func (result i32 i64 f32))))"#,
        Returns,
    );
    assert_eq!(
        binding_reason(&err),
        (
            "Returns.pair",
            "env.pair",
            "return type is expected to be a tuple of size 3"
        )
    );

    let err = instantiate_err(
        r#"(module (import "env" "f" (func (result i32))) (import "env" "pair" (func (result i32 f64))))"#,
        Returns,
    );
    assert_eq!(
        binding_reason(&err).2,
        "return tuple item #1 is expected to be of type 'f64'"
    );
}

struct Twice;

impl Host for Twice {
    fn define(bindings: &mut HostBindings<Self>) {
        bindings
            .func("env", "f", "first", |_: &mut Twice| {})
            .func("env", "f", "second", |_: &mut Twice| {});
    }
}

#[test_log::test]
fn ambiguous_import() {
    let err = instantiate_err(r#"(module (import "env" "f" (func)))"#, Twice);
    match err {
        Error::AmbiguousImport {
            module,
            kind,
            import,
            count,
        } => {
            assert_eq!(module, "custom");
            assert_eq!(kind, ExternKind::Function);
            assert_eq!(import, "env.f");
            assert_eq!(count, 2);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test_log::test]
fn module_names_must_match_exactly() {
    // `f` is registered under "env" only
    let err = instantiate_err(r#"(module (import "" "f" (func)))"#, NoParams);
    assert!(matches!(err, Error::MissingImport { ref import, .. } if import == "f"));

    let err = instantiate_err(r#"(module (import "Env" "f" (func)))"#, NoParams);
    assert!(matches!(err, Error::MissingImport { ref import, .. } if import == "Env.f"));
}

#[test_log::test]
fn methods_never_satisfy_global_imports() {
    let err = instantiate_err(r#"(module (import "env" "f" (global i32)))"#, NoParams);
    assert!(matches!(
        err,
        Error::MissingImport {
            kind: ExternKind::Global,
            ..
        }
    ));
}

#[test_log::test]
fn repeated_imports_bind_once() -> anyhow::Result<()> {
    let engine = Engine::default();
    let module = Module::from_wat(
        &engine,
        "repeated",
        r#"(module
            (import "env" "no_params_no_results" (func $a))
            (import "env" "no_params_no_results" (func $b))
            (import "env" "one_i32_param_no_results" (func (param i32)))
            (import "env" "one_i64_param_no_results" (func (param i64)))
            (import "env" "one_f32_param_no_results" (func (param f32)))
            (import "env" "one_f64_param_no_results" (func (param f64)))
            (import "env" "one_param_of_each_type" (func (param i32 i64 f32 f64)))
            (import "env" "no_params_one_i32_result" (func (result i32)))
            (import "env" "no_params_one_i64_result" (func (result i64)))
            (import "env" "no_params_one_f32_result" (func (result f32)))
            (import "env" "no_params_one_f64_result" (func (result f64)))
            (import "env" "one_param_and_result_of_each_type" (func (param i32 i64 f32 f64) (result i32 i64 f32 f64)))
            (import "other" "no_params_no_results" (func))
            (func (export "run") call $a call $b))"#,
    )?;
    assert_eq!(module.imports().len(), 13);

    let mut store = Store::new(&engine, Recorder::default())?;
    let instance = module.instantiate(&mut store)?;
    instance.call(&mut store, "run", &[])?;
    assert_eq!(
        store.host()?.calls,
        ["env.no_params_no_results", "env.no_params_no_results"]
    );
    Ok(())
}

struct OneParam;

impl OneParam {
    fn f(&mut self, _v: i32) {}
}

host_imports! {
    OneParam {
        func "env" "f" => f,
    }
}

#[test_log::test]
fn repeated_import_with_another_signature_is_checked() {
    let err = instantiate_err(
        r#"(module
            (import "env" "f" (func (param i32)))
            (import "env" "f" (func (param i64))))"#,
        OneParam,
    );
    assert_eq!(
        binding_reason(&err),
        (
            "OneParam.f",
            "env.f",
            "parameter #0 is expected to be of type 'i64'"
        )
    );
}

struct Both {
    g: Global<i32>,
}

impl Both {
    fn x(&mut self) {}
}

host_imports! {
    Both {
        func "env" "x" => x,
        global "env" "x" => g,
    }
}

#[test_log::test]
fn one_name_imported_as_two_kinds() -> anyhow::Result<()> {
    let engine = Engine::default();
    let module = Module::from_wat(
        &engine,
        "two_kinds",
        r#"(module
            (import "env" "x" (func))
            (import "env" "x" (global i32)))"#,
    )?;
    let mut store = Store::new(&engine, Both { g: Global::new(7) })?;

    let err = module.instantiate(&mut store).unwrap_err();
    assert!(
        matches!(err, Error::Unsupported(ref msg) if msg.contains("env.x")),
        "{err:?}"
    );
    assert!(!store.host()?.g.is_bound());
    Ok(())
}
