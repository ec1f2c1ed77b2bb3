/// Fractional value loss of a constant-product (x·y = k) liquidity position
/// versus simply holding, for one rebalancing period.
///
/// `price_change_pct` is the fractional price move relative to the period's
/// opening ratio. With `ratio = 1 + price_change_pct` the closed form is
/// `|2·sqrt(ratio)/(1 + ratio) - 1|`: always ≥ 0, exactly 0 at ratio 1, and
/// growing with the magnitude of the move. A ratio ≤ 0 (price change of
/// -100% or worse) is not physically meaningful and returns 0.
pub fn impermanent_loss(price_change_pct: f64) -> f64 {
    let ratio = 1.0 + price_change_pct;
    if ratio <= 0.0 {
        return 0.0;
    }
    (2.0 * ratio.sqrt() / (1.0 + ratio) - 1.0).abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn no_price_change_means_no_loss() {
        assert_eq!(impermanent_loss(0.0), 0.0);
    }

    #[test]
    fn known_value_for_21_pct_move() {
        // ratio = 1.21, sqrt = 1.1 exactly: |2*1.1/2.21 - 1| = 0.00452488...
        assert_relative_eq!(impermanent_loss(0.21), 0.004524886877828055, epsilon = 1e-12);
    }

    #[test]
    fn large_moves_in_both_directions_lose_value() {
        let up = impermanent_loss(0.5);
        let down = impermanent_loss(-0.5);
        assert!(up > 0.0);
        assert!(down > 0.0);
        // The formula is not symmetric in r; a -50% move diverges further
        // from the opening ratio than a +50% move.
        assert!(down > up);
    }

    #[test]
    fn loss_grows_with_magnitude() {
        assert!(impermanent_loss(0.1) < impermanent_loss(0.2));
        assert!(impermanent_loss(-0.1) < impermanent_loss(-0.2));
    }

    #[test]
    fn total_collapse_is_guarded() {
        assert_eq!(impermanent_loss(-1.0), 0.0);
        assert_eq!(impermanent_loss(-1.5), 0.0);
    }
}
