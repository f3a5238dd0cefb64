use wasm_host::{host_imports, Config, Engine, Error, Module, ReturnValue, Store, Val};

#[derive(Default)]
struct Splitter {
    seen: Vec<i64>,
}

impl Splitter {
    /// Spreads one input over one result of each kind.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        reason = "test inputs are small and exactly representable"
    )]
    fn split(&mut self, v: i64) -> (i32, i64, f32, f64) {
        self.seen.push(v);
        (v as i32, v * 2, v as f32 / 2.0, v as f64 / 4.0)
    }
}

host_imports! {
    Splitter {
        func "env" "split" => split,
    }
}

#[test_log::test]
fn four_results_from_the_host() -> anyhow::Result<()> {
    let engine = Engine::default();
    let module = Module::from_wat(&engine, "multi_value", include_str!("./modules/multi_value.wat"))?;
    let mut store = Store::new(&engine, Splitter::default())?;
    let instance = module.instantiate(&mut store)?;

    let ret = instance.call(&mut store, "roundtrip", &[Val::I64(10)])?;
    assert_eq!(
        ret,
        ReturnValue::Tuple(
            [Val::I32(10), Val::I64(20), Val::from(5.0_f32), Val::from(2.5_f64)]
                .into_iter()
                .collect()
        )
    );
    // nested tuples flatten left to right
    assert_eq!(
        ret.typed::<(i32, (i64, f32), f64)>(),
        Some((10, (20, 5.0), 2.5))
    );
    assert_eq!(store.host()?.seen, [10]);

    let swapped: (i64, i32) = instance.call_typed(&mut store, "swap", &[Val::I32(1), Val::I64(2)])?;
    assert_eq!(swapped, (2, 1));
    Ok(())
}

#[test_log::test]
fn multi_value_can_be_disabled() {
    let mut config = Config::default();
    config.multi_value(false);
    let engine = Engine::new(&config);

    let err = Module::from_wat(&engine, "multi_value", include_str!("./modules/multi_value.wat")).unwrap_err();
    assert!(matches!(err, Error::InvalidModule { .. }));
}
