use wasm_host::{Engine, Error, Module, Mutability, Store, Val, ValueKind};

#[test_log::test]
fn global_exports() -> anyhow::Result<()> {
    let engine = Engine::default();
    let module = Module::from_wat(&engine, "global_exports", include_str!("./modules/global_exports.wat"))?;
    let mut store = Store::new(&engine, ())?;
    let instance = module.instantiate(&mut store)?;

    let expected = [
        ("global_i32", ValueKind::Int32, Mutability::Const, Val::I32(0)),
        ("global_i32_mut", ValueKind::Int32, Mutability::Var, Val::I32(1)),
        ("global_i64", ValueKind::Int64, Mutability::Const, Val::I64(2)),
        ("global_i64_mut", ValueKind::Int64, Mutability::Var, Val::I64(3)),
        ("global_f32", ValueKind::Float32, Mutability::Const, Val::from(4.0_f32)),
        ("global_f32_mut", ValueKind::Float32, Mutability::Var, Val::from(5.0_f32)),
        ("global_f64", ValueKind::Float64, Mutability::Const, Val::from(6.0_f64)),
        ("global_f64_mut", ValueKind::Float64, Mutability::Var, Val::from(7.0_f64)),
    ];
    for (name, kind, mutability, value) in expected {
        let global = instance.get_global(name).unwrap();
        assert_eq!(global.name(), name);
        assert_eq!(global.kind(), kind);
        assert_eq!(global.mutability(), mutability);
        assert_eq!(global.get(&store)?, value);
    }
    Ok(())
}

#[test_log::test]
fn writes_reach_the_module() -> anyhow::Result<()> {
    let engine = Engine::default();
    let module = Module::from_wat(&engine, "global_exports", include_str!("./modules/global_exports.wat"))?;
    let mut store = Store::new(&engine, ())?;
    let instance = module.instantiate(&mut store)?;

    let global = instance.get_global("global_i32_mut").unwrap();
    global.set(&mut store, Val::I32(42))?;
    assert_eq!(global.get(&store)?, Val::I32(42));
    assert_eq!(instance.call_typed::<_, i32>(&mut store, "get_global_i32_mut", &[])?, 42);

    let err = global.set(&mut store, Val::I64(42)).unwrap_err();
    assert!(matches!(err, Error::InvalidOperation(_)));

    let err = instance
        .get_global("global_i32")
        .unwrap()
        .set(&mut store, Val::I32(1))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "global export 'global_i32' is immutable and cannot be modified"
    );
    Ok(())
}
