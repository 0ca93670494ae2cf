use alloy_primitives::U256;
use rust_decimal::Decimal;

pub fn assert_decimal_near(actual: Decimal, expected: Decimal, tolerance: Decimal) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= tolerance,
        "expected {} ± {}, got {}",
        expected,
        tolerance,
        actual
    );
}

pub fn assert_units_near(actual: U256, expected: U256, tolerance: u64) {
    let diff = if actual > expected {
        actual - expected
    } else {
        expected - actual
    };
    assert!(
        diff <= U256::from(tolerance),
        "expected {} ± {}, got {}",
        expected,
        tolerance,
        actual
    );
}

pub fn product(balances: &[U256]) -> U256 {
    balances.iter().fold(U256::from(1u8), |acc, b| acc * *b)
}
