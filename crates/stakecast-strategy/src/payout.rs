use crate::error::{ensure_non_negative, ensure_unit_interval, StrategyError};

/// Profit for one resolved epoch under pro-rata settlement.
///
/// The pool (every participant's stake plus external `revenue`) is shared by
/// everyone who staked on the correct side, in proportion to their
/// correct-side stake. `others_*` describe all other participants in
/// aggregate. If nobody staked on the correct side there is no payout and the
/// whole amount sent is lost.
pub fn calc_payout(
    others_stake: f64,
    others_accuracy: f64,
    stake_up: f64,
    stake_down: f64,
    revenue: f64,
    true_up_close: bool,
) -> Result<f64, StrategyError> {
    ensure_non_negative("others_stake", others_stake)?;
    ensure_unit_interval("others_accuracy", others_accuracy)?;
    ensure_non_negative("stake_up", stake_up)?;
    ensure_non_negative("stake_down", stake_down)?;
    ensure_non_negative("revenue", revenue)?;

    let amt_sent = stake_up + stake_down;
    let others_stake_correct = others_stake * others_accuracy;
    let tot_stake = others_stake + stake_up + stake_down;

    let my_stake_correct = if true_up_close { stake_up } else { stake_down };
    let tot_stake_correct = others_stake_correct + my_stake_correct;

    if tot_stake_correct == 0.0 {
        return Ok(-amt_sent);
    }

    let percent_to_me = my_stake_correct / tot_stake_correct;
    let amt_received = (revenue + tot_stake) * percent_to_me;
    Ok(amt_received - amt_sent)
}
