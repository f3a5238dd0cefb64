use wasm_host::{host_imports, Engine, Error, Module, Store, Val};

#[derive(Default)]
struct Faulty {
    calls: u32,
}

impl Faulty {
    fn fail(&mut self) -> Result<(), String> {
        self.calls += 1;
        Err("the host refused".to_string())
    }

    fn explode(&mut self) {
        panic!("kaboom");
    }

    fn check(&mut self, v: i32) -> Result<i32, &'static str> {
        if v < 0 {
            Err("negative input")
        } else {
            Ok(v * 2)
        }
    }
}

host_imports! {
    Faulty {
        func "env" "fail" => fail,
        func "env" "explode" => explode,
        func "env" "check" => check,
    }
}

fn setup() -> anyhow::Result<(Store<Faulty>, wasm_host::Instance)> {
    let engine = Engine::default();
    let module = Module::from_wat(&engine, "traps", include_str!("./modules/traps.wat"))?;
    let mut store = Store::new(&engine, Faulty::default())?;
    let instance = module.instantiate(&mut store)?;
    Ok((store, instance))
}

#[test_log::test]
fn host_errors_become_traps() -> anyhow::Result<()> {
    let (mut store, instance) = setup()?;

    let err = instance.call(&mut store, "call_fail", &[]).unwrap_err();
    match &err {
        Error::Trap { message } => assert!(message.contains("the host refused"), "{message}"),
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(store.host()?.calls, 1);

    let doubled: i32 = instance.call_typed(&mut store, "call_check", &[Val::I32(21)])?;
    assert_eq!(doubled, 42);
    let err = instance
        .call(&mut store, "call_check", &[Val::I32(-1)])
        .unwrap_err();
    assert!(err.to_string().contains("negative input"));

    // the instance stays usable after a trap
    let doubled: i32 = instance.call_typed(&mut store, "call_check", &[Val::I32(1)])?;
    assert_eq!(doubled, 2);
    Ok(())
}

#[test_log::test]
fn host_panics_become_traps() -> anyhow::Result<()> {
    let (mut store, instance) = setup()?;

    let err = instance.call(&mut store, "call_explode", &[]).unwrap_err();
    assert!(matches!(err, Error::Trap { .. }));
    assert!(err.to_string().contains("host function panicked: kaboom"), "{err}");
    Ok(())
}

#[test_log::test]
fn module_traps() -> anyhow::Result<()> {
    let (mut store, instance) = setup()?;

    let err = instance.call(&mut store, "unreachable", &[]).unwrap_err();
    assert!(matches!(err, Error::Trap { .. }));
    Ok(())
}

#[test_log::test]
fn start_function_traps() -> anyhow::Result<()> {
    let engine = Engine::default();
    let module = Module::from_wat(&engine, "start_trap", include_str!("./modules/start_trap.wat"))?;
    let mut store = Store::new(&engine, Faulty::default())?;

    let err = module.instantiate(&mut store).unwrap_err();
    match &err {
        Error::InstantiationTrap { module, message } => {
            assert_eq!(module, "start_trap");
            assert!(message.contains("the host refused"), "{message}");
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(store.host()?.calls, 1);
    Ok(())
}
