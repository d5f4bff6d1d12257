//! The tile section: opaque partition bytes, length-prefixed for every
//! tile but the last.

use crate::consts::MAX_TILES;
use crate::record::Tile;

/// Appends at most `MAX_TILES` tiles to `out`; extra tiles in the record are
/// silently discarded.
pub fn encode(out: &mut Vec<u8>, tiles: &[Tile]) {
    let capped: Vec<&Tile> = tiles.iter().take(MAX_TILES).collect();
    for (i, tile) in capped.iter().enumerate() {
        let is_last = i + 1 == capped.len();
        if !is_last {
            out.extend_from_slice(&(tile.data.len() as u32).to_be_bytes());
        }
        out.extend_from_slice(&tile.data);
    }
}

/// Greedily consumes up to `MAX_TILES - 1` length-prefixed tiles, then
/// treats any remaining bytes as the final, unprefixed tile. `MAX_TILES`
/// bounds what would otherwise be an unresolvable "where does the last
/// tile start" ambiguity (see DESIGN.md).
pub fn parse(bytes: &[u8]) -> Vec<Tile> {
    let mut tiles = Vec::new();
    let mut pos = 0usize;
    while tiles.len() + 1 < MAX_TILES && bytes.len() - pos >= 4 {
        let size = u32::from_be_bytes(bytes[pos..pos + 4].try_into().unwrap()) as usize;
        if pos + 4 + size > bytes.len() {
            break;
        }
        tiles.push(Tile { data: bytes[pos + 4..pos + 4 + size].to_vec() });
        pos += 4 + size;
    }
    if pos < bytes.len() {
        tiles.push(Tile { data: bytes[pos..].to_vec() });
    }
    tiles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_tile_has_no_prefix() {
        let tiles = vec![Tile { data: vec![1, 2, 3] }];
        let mut out = Vec::new();
        encode(&mut out, &tiles);
        assert_eq!(out, vec![1, 2, 3]);
        let parsed = parse(&out);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].data, vec![1, 2, 3]);
    }

    #[test]
    fn multi_tile_round_trip() {
        let tiles = vec![
            Tile { data: vec![0xAA; 5] },
            Tile { data: vec![0xBB; 3] },
        ];
        let mut out = Vec::new();
        encode(&mut out, &tiles);
        let parsed = parse(&out);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].data, vec![0xAA; 5]);
        assert_eq!(parsed[1].data, vec![0xBB; 3]);
    }

    #[test]
    fn extra_tiles_beyond_cap_are_discarded() {
        let tiles = vec![
            Tile { data: vec![1] },
            Tile { data: vec![2] },
            Tile { data: vec![3] },
            Tile { data: vec![4] },
        ];
        let mut out = Vec::new();
        encode(&mut out, &tiles);
        let parsed = parse(&out);
        assert_eq!(parsed.len(), MAX_TILES);
    }
}
