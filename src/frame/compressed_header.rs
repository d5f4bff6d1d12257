//! The Boolean-coded compressed header: probability updates whose
//! presence is gated entirely by `FrameState` set up while parsing/encoding
//! the uncompressed header.

use crate::boolcoder::{decode_term_subexp, encode_term_subexp, BoolDecoder, BoolEncoder};
use crate::consts::TX_MODE_TO_BIGGEST_TX_SIZE;
use crate::enums::{ReferenceMode, TxMode};
use crate::error::Result;
use crate::record::{CoefProbUpdate, CompressedHeader, DiffUpdateProb, MvProbEntry};
use crate::state::FrameState;

const INTER_MODE_PROBS: usize = 21;
const INTERP_FILTER_PROBS: usize = 8; // VP9-spec value; see DESIGN.md Open Question #3
const IS_INTER_PROBS: usize = 4;
const Y_MODE_PROBS: usize = 36;
const PARTITION_PROBS: usize = 48;
const TX_MODE_PROBS: usize = 12;
const SKIP_PROBS: usize = 3;
const COEF_PROBS_PER_TX_SIZE: usize = 396;
const MV_PROBS_BASE: usize = 45;
const MV_PROBS_HP_EXTRA: usize = 4;

fn prob_at(list: &[DiffUpdateProb], i: usize) -> DiffUpdateProb {
    list.get(i).copied().unwrap_or_default()
}

fn write_diff_update_prob(enc: &mut BoolEncoder, entry: DiffUpdateProb) -> Result<()> {
    enc.write_bool(entry.update_prob, 252)?;
    if entry.update_prob {
        encode_term_subexp(enc, entry.delta)?;
    }
    Ok(())
}

fn read_diff_update_prob(dec: &mut BoolDecoder) -> Result<DiffUpdateProb> {
    let update_prob = dec.read_bool(252)?;
    let delta = if update_prob { decode_term_subexp(dec)? } else { 0 };
    Ok(DiffUpdateProb { update_prob, delta })
}

fn write_prob_sequence(enc: &mut BoolEncoder, list: &[DiffUpdateProb], count: usize) -> Result<()> {
    for i in 0..count {
        write_diff_update_prob(enc, prob_at(list, i))?;
    }
    Ok(())
}

fn read_prob_sequence(dec: &mut BoolDecoder, count: usize) -> Result<Vec<DiffUpdateProb>> {
    (0..count).map(|_| read_diff_update_prob(dec)).collect()
}

/// Encodes the compressed header into a fresh `BoolEncoder`, flushes it, and
/// returns the final byte payload (`header_size_in_bytes` is its length).
pub fn encode(hdr: &CompressedHeader, state: &mut FrameState) -> Result<Vec<u8>> {
    let mut enc = BoolEncoder::new();

    let tx_mode = if state.lossless { TxMode::Only4x4 } else { hdr.tx_mode };
    if state.lossless {
        state.tx_mode = TxMode::Only4x4;
    } else {
        let raw = (tx_mode.as_bits()).min(3);
        enc.write_literal(raw, 2)?;
        let final_tx_mode = if raw == 3 {
            let select = tx_mode == TxMode::TxModeSelect;
            enc.write_bool(select, 128)?;
            if select { TxMode::TxModeSelect } else { TxMode::Allow32x32 }
        } else {
            TxMode::from_bits(raw)
        };
        state.tx_mode = final_tx_mode;
    }

    if state.tx_mode == TxMode::TxModeSelect {
        write_prob_sequence(&mut enc, &hdr.tx_mode_probs, TX_MODE_PROBS)?;
    }

    let biggest = TX_MODE_TO_BIGGEST_TX_SIZE[state.tx_mode.as_bits() as usize];
    for tx_sz in 0..=biggest {
        let entry = hdr.coef_probs.get(tx_sz as usize).cloned().unwrap_or_default();
        enc.write_bool(entry.update_probs, 128)?;
        if entry.update_probs {
            write_prob_sequence(&mut enc, &entry.probs, COEF_PROBS_PER_TX_SIZE)?;
        }
    }

    write_prob_sequence(&mut enc, &hdr.skip_prob, SKIP_PROBS)?;

    if !state.frame_is_intra {
        write_prob_sequence(&mut enc, &hdr.inter_mode_probs, INTER_MODE_PROBS)?;

        if state.interpolation_filter == crate::enums::InterpolationFilter::Switchable {
            write_prob_sequence(&mut enc, &hdr.interp_filter_probs, INTERP_FILTER_PROBS)?;
        }

        write_prob_sequence(&mut enc, &hdr.is_inter_probs, IS_INTER_PROBS)?;

        let reference_mode = if state.compound_reference_allowed {
            enc.write_bool(hdr.frame_reference_mode.non_single_reference, 128)?;
            if !hdr.frame_reference_mode.non_single_reference {
                ReferenceMode::SingleReference
            } else {
                enc.write_bool(hdr.frame_reference_mode.reference_select, 128)?;
                if hdr.frame_reference_mode.reference_select {
                    ReferenceMode::ReferenceModeSelect
                } else {
                    ReferenceMode::CompoundReference
                }
            }
        } else {
            ReferenceMode::SingleReference
        };
        state.reference_mode = reference_mode;

        let mut cursor = 0usize;
        let mut take = |n: usize, cursor: &mut usize| -> Vec<DiffUpdateProb> {
            let slice: Vec<DiffUpdateProb> = (0..n).map(|i| prob_at(&hdr.frame_reference_mode_probs, *cursor + i)).collect();
            *cursor += n;
            slice
        };
        if reference_mode == ReferenceMode::ReferenceModeSelect {
            for e in take(5, &mut cursor) {
                write_diff_update_prob(&mut enc, e)?;
            }
        }
        if reference_mode != ReferenceMode::CompoundReference {
            for e in take(5, &mut cursor) {
                write_diff_update_prob(&mut enc, e)?;
            }
        }
        if reference_mode != ReferenceMode::SingleReference {
            for e in take(5, &mut cursor) {
                write_diff_update_prob(&mut enc, e)?;
            }
        }

        write_prob_sequence(&mut enc, &hdr.y_mode_probs, Y_MODE_PROBS)?;
        write_prob_sequence(&mut enc, &hdr.partition_probs, PARTITION_PROBS)?;

        let mv_count = MV_PROBS_BASE + if state.allow_high_precision_mv { MV_PROBS_HP_EXTRA } else { 0 };
        for i in 0..mv_count {
            let entry = hdr.mv_probs.get(i).copied().unwrap_or_default();
            enc.write_bool(entry.update_mv_prob, 252)?;
            if entry.update_mv_prob {
                enc.write_literal(entry.mv_prob as u32, 7)?;
            }
        }
    }

    enc.finish()
}

/// Parses the compressed header out of exactly `state.header_size_in_bytes`
/// bytes, mirroring [`encode`] section for section.
pub fn parse(bytes: &[u8], state: &mut FrameState) -> Result<CompressedHeader> {
    let mut dec = BoolDecoder::new(bytes)?;
    let mut hdr = CompressedHeader::default();

    if state.lossless {
        state.tx_mode = TxMode::Only4x4;
        hdr.tx_mode = TxMode::Only4x4;
    } else {
        let raw = dec.read_literal(2)?;
        let final_tx_mode = if raw == 3 {
            let select = dec.read_bool(128)?;
            if select { TxMode::TxModeSelect } else { TxMode::Allow32x32 }
        } else {
            TxMode::from_bits(raw)
        };
        state.tx_mode = final_tx_mode;
        hdr.tx_mode = final_tx_mode;
    }

    if state.tx_mode == TxMode::TxModeSelect {
        hdr.tx_mode_probs = read_prob_sequence(&mut dec, TX_MODE_PROBS)?;
    }

    let biggest = TX_MODE_TO_BIGGEST_TX_SIZE[state.tx_mode.as_bits() as usize];
    for _ in 0..=biggest {
        let update_probs = dec.read_bool(128)?;
        let probs = if update_probs { read_prob_sequence(&mut dec, COEF_PROBS_PER_TX_SIZE)? } else { Vec::new() };
        hdr.coef_probs.push(CoefProbUpdate { update_probs, probs });
    }

    hdr.skip_prob = read_prob_sequence(&mut dec, SKIP_PROBS)?;

    if !state.frame_is_intra {
        hdr.inter_mode_probs = read_prob_sequence(&mut dec, INTER_MODE_PROBS)?;

        if state.interpolation_filter == crate::enums::InterpolationFilter::Switchable {
            hdr.interp_filter_probs = read_prob_sequence(&mut dec, INTERP_FILTER_PROBS)?;
        }

        hdr.is_inter_probs = read_prob_sequence(&mut dec, IS_INTER_PROBS)?;

        let reference_mode = if state.compound_reference_allowed {
            let non_single_reference = dec.read_bool(128)?;
            hdr.frame_reference_mode.non_single_reference = non_single_reference;
            if !non_single_reference {
                ReferenceMode::SingleReference
            } else {
                let reference_select = dec.read_bool(128)?;
                hdr.frame_reference_mode.reference_select = reference_select;
                if reference_select { ReferenceMode::ReferenceModeSelect } else { ReferenceMode::CompoundReference }
            }
        } else {
            ReferenceMode::SingleReference
        };
        state.reference_mode = reference_mode;

        let mut probs = Vec::new();
        if reference_mode == ReferenceMode::ReferenceModeSelect {
            probs.extend(read_prob_sequence(&mut dec, 5)?);
        }
        if reference_mode != ReferenceMode::CompoundReference {
            probs.extend(read_prob_sequence(&mut dec, 5)?);
        }
        if reference_mode != ReferenceMode::SingleReference {
            probs.extend(read_prob_sequence(&mut dec, 5)?);
        }
        hdr.frame_reference_mode_probs = probs;

        hdr.y_mode_probs = read_prob_sequence(&mut dec, Y_MODE_PROBS)?;
        hdr.partition_probs = read_prob_sequence(&mut dec, PARTITION_PROBS)?;

        let mv_count = MV_PROBS_BASE + if state.allow_high_precision_mv { MV_PROBS_HP_EXTRA } else { 0 };
        for _ in 0..mv_count {
            let update_mv_prob = dec.read_bool(252)?;
            let mv_prob = if update_mv_prob { dec.read_literal(7)? as u8 } else { 0 };
            hdr.mv_probs.push(MvProbEntry { update_mv_prob, mv_prob });
        }
    }

    Ok(hdr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::CompressedHeader;

    #[test]
    fn lossless_header_is_just_the_flush() {
        let mut state = FrameState::new();
        state.lossless = true;
        state.frame_is_intra = true;
        let bytes = encode(&CompressedHeader::default(), &mut state).unwrap();
        assert_eq!(bytes.len(), 4);
    }

    #[test]
    fn skip_prob_updates_round_trip() {
        let mut state = FrameState::new();
        state.frame_is_intra = true;
        let hdr = CompressedHeader {
            skip_prob: vec![
                DiffUpdateProb { update_prob: true, delta: 9 },
                DiffUpdateProb { update_prob: false, delta: 0 },
                DiffUpdateProb { update_prob: true, delta: 40 },
            ],
            ..Default::default()
        };
        let bytes = encode(&hdr, &mut state).unwrap();

        let mut parse_state = FrameState::new();
        parse_state.frame_is_intra = true;
        parse_state.lossless = state.lossless;
        let parsed = parse(&bytes, &mut parse_state).unwrap();
        assert_eq!(parsed.skip_prob, hdr.skip_prob);
    }
}
