use ferret::entropy::Entropy;
use ferret::formula::{default_damage, DEFAULT_FORMULA};
use ferret::rules::entropy::FixedAverage;
use ferret::{evaluate, CharacterStats, Formula, FormulaError};

fn stats(atk: i32, def: i32, mat: i32, mdf: i32) -> CharacterStats {
    CharacterStats {
        hp: 100,
        mp: 40,
        atk,
        def,
        mat,
        mdf,
        agi: 12,
        luk: 9,
        level: 4,
    }
}

#[test]
fn classic_formulas() {
    let mut entropy = Entropy::new(FixedAverage);
    let a = stats(30, 12, 25, 8);
    let b = stats(14, 10, 6, 5);
    assert_eq!(evaluate(DEFAULT_FORMULA, &a, &b, &mut entropy), Ok(100.0));
    assert_eq!(default_damage(&a, &b), 100.0);
    assert_eq!(
        evaluate("100 + a.mat * 2 - b.mdf * 2", &a, &b, &mut entropy),
        Ok(140.0)
    );
    assert_eq!(
        evaluate("a.hp / 2 + b.mp + a.agi - b.luk + a.level", &a, &b, &mut entropy),
        Ok(97.0)
    );
    assert_eq!(
        evaluate("max(a.atk, b.atk, 50) - min(a.def, b.def)", &a, &b, &mut entropy),
        Ok(40.0)
    );
    assert_eq!(
        evaluate("floor(a.atk / 7) + ceil(0.2) + round(2.5) + abs(-4)", &a, &b, &mut entropy),
        Ok(12.0)
    );
    assert_eq!(evaluate("magical(2)", &a, &b, &mut entropy), Ok(180.0));
}

#[test]
fn parsed_once_evaluated_many_times() {
    let mut entropy = Entropy::new(FixedAverage);
    let formula = Formula::parse("a.atk * 4 - b.def * 2").unwrap();
    for atk in 1..5 {
        let a = stats(atk * 10, 0, 0, 0);
        let b = stats(0, 5, 0, 0);
        assert_eq!(
            formula.evaluate(&a, &b, &mut entropy),
            Ok(f64::from(atk * 40 - 10))
        );
    }
}

#[test]
fn parse_errors() {
    for source in &[
        "",
        "a.atk +",
        "(1 + 2",
        "a.speed",
        "c.atk",
        "a",
        "sqrt(4)",
        "1 2",
        "a.atk % 2",
        "b.def = 0",
        "Math.random()",
        "return 1",
    ] {
        assert!(Formula::parse(source).unwrap_err().is_parse(), "{}", source);
    }
    assert_eq!(
        Formula::parse("a.atk + ?"),
        Err(FormulaError::Parse {
            position: 8,
            message: "unexpected character `?`".to_string(),
        })
    );
}

#[test]
fn division_by_zero() {
    let mut entropy = Entropy::new(FixedAverage);
    let a = stats(30, 12, 25, 8);
    let b = stats(14, 10, 6, 5);
    assert_eq!(
        evaluate("a.atk / (b.def - 10)", &a, &b, &mut entropy),
        Err(FormulaError::DivisionByZero)
    );
}
