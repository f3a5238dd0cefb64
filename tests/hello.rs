use wasm_host::{host_imports, Engine, Error, ExternKind, Module, Store};

#[derive(Default)]
struct Greeter {
    greeted: u32,
}

impl Greeter {
    fn hello(&mut self) {
        tracing::info!("Hello from the host!");
        self.greeted += 1;
    }
}

host_imports! {
    Greeter {
        func "hello" => hello,
    }
}

#[test_log::test]
fn hello() -> anyhow::Result<()> {
    let engine = Engine::default();
    let module = Module::from_wat(&engine, "hello", include_str!("./modules/hello.wat"))?;
    let mut store = Store::new(&engine, Greeter::default())?;

    let instance = module.instantiate(&mut store)?;
    instance.call(&mut store, "run", &[])?;
    instance.call(&mut store, "run", &[])?;

    assert_eq!(store.host()?.greeted, 2);
    Ok(())
}

#[test_log::test]
fn missing_import_names_the_import() -> anyhow::Result<()> {
    let engine = Engine::default();
    let module = Module::from_wat(&engine, "hello", include_str!("./modules/hello.wat"))?;
    let mut store = Store::new(&engine, ())?;

    let err = module.instantiate(&mut store).unwrap_err();
    match &err {
        Error::MissingImport { module, kind, import } => {
            assert_eq!(module, "hello");
            assert_eq!(*kind, ExternKind::Function);
            assert_eq!(import, "hello");
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(err.to_string().contains("'hello'"));
    Ok(())
}

#[test_log::test]
fn descriptors() -> anyhow::Result<()> {
    let engine = Engine::default();
    let module = Module::from_wat(&engine, "hello", include_str!("./modules/hello.wat"))?;

    let imports: Vec<_> = module.imports().iter().map(ToString::to_string).collect();
    assert_eq!(imports, ["hello"]);
    let import = &module.imports().all()[0];
    assert_eq!(import.module(), "");
    assert_eq!(import.kind(), ExternKind::Function);

    let exports: Vec<_> = module.exports().iter().map(|e| e.name()).collect();
    assert_eq!(exports, ["run"]);
    Ok(())
}
