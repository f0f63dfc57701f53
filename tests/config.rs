#![cfg(feature = "serde")]

use std::error::Error;

use ltl_rewards::{ClockedPropositions, Info, Mode, Outcome, PropertySpec, RewardChecker, Signal, Tick, Value, Verdict};

#[test]
fn property_specs_from_json() -> Result<(), Box<dyn Error>> {
    let text = r#"[
        {"formula": "a => b", "reward": -1, "mode": "violation"},
        {"formula": "F b", "reward": 2.5, "mode": "satisfaction"}
    ]"#;

    let specs: Vec<PropertySpec> = serde_json::from_str(text)?;

    assert_eq!(specs.len(), 2);
    assert_eq!(specs[0].mode, Mode::Violation);
    assert_eq!(specs[1].formula, "F b");

    let rules: [(&str, fn(Tick) -> bool); 2] = [("a", |t| t >= 1), ("b", |t| t >= 2)];
    let mut propositions = ClockedPropositions::new(rules)?;
    let mut checker = RewardChecker::new(specs, propositions.alphabet())?;

    checker.reset(&mut propositions)?;
    let signal = checker.step(&mut propositions)?;

    assert_eq!(signal.reward, -1.0);

    let signal = checker.step(&mut propositions)?;

    assert_eq!(signal.reward, 2.5);
    Ok(())
}

#[test]
fn unknown_mode_is_rejected() {
    let text = r#"{"formula": "a", "reward": 1, "mode": "sometimes"}"#;

    assert!(serde_json::from_str::<PropertySpec>(text).is_err());
}

#[test]
fn signals_serialize_without_empty_buckets() -> Result<(), Box<dyn Error>> {
    let signal = Signal {
        reward: 0.0,
        info: Info {
            mode: Some(Outcome::Reward),
            ..Info::default()
        },
        tick: 3,
    };

    let json = serde_json::to_value(&signal)?;

    assert_eq!(json, serde_json::json!({"reward": 0.0, "info": {"mode": "reward"}, "tick": 3}));

    let info: Info = serde_json::from_str(r#"{"satisfactions": ["c"], "mode": "termination"}"#)?;

    assert_eq!(info.satisfactions, vec!["c".to_string()]);
    assert!(info.violations.is_empty());
    assert_eq!(info.mode, Some(Outcome::Termination));

    Ok(())
}

#[test]
fn values_and_verdicts() -> Result<(), Box<dyn Error>> {
    let values: Vec<Value> = serde_json::from_str("[true, 20, 0.5]")?;

    assert_eq!(values, vec![Value::from(true), Value::from(20), Value::from(0.5)]);
    assert_eq!(serde_json::to_string(&Verdict::Inconclusive)?, "\"inconclusive\"");

    Ok(())
}
