//! ASCII level mini-format
//!
//! ```text
//! # MAPPING
//! A = 2 #ff9900
//! I = indestructible #444444
//! # ENDMAPPING
//!
//! # LEVEL
//! '  AAAA  '
//!   AIIA
//! # ENDLEVEL
//! ```
//!
//! Each mapped character is one brick. Rows are right-aligned against the far
//! wall; quoting a row keeps its trailing spaces so they can carve corridors.
//! Unmapped characters and spaces leave gaps. Colors are for the renderer and
//! ignored here.

use std::collections::HashMap;

use super::{BrickDef, BrickLayout};
use crate::consts::*;
use crate::error::LevelError;

/// Brick properties for one mapped character
#[derive(Debug, Clone, Copy, PartialEq)]
struct Glyph {
    health: u32,
    indestructible: bool,
}

/// Parse a level file into a layout for the given field width
pub fn parse_level(content: &str, field_width: f32) -> Result<BrickLayout, LevelError> {
    let mut in_mapping = false;
    let mut in_level = false;
    let mut mapping: HashMap<char, Glyph> = HashMap::new();
    let mut rows: Vec<&str> = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim();
        match trimmed {
            "# MAPPING" => {
                in_mapping = true;
                continue;
            }
            "# ENDMAPPING" => {
                in_mapping = false;
                continue;
            }
            "# LEVEL" => {
                in_level = true;
                continue;
            }
            "# ENDLEVEL" => {
                in_level = false;
                continue;
            }
            _ => {}
        }

        if in_level {
            rows.push(line);
            continue;
        }
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if in_mapping {
            let (symbol, glyph) = parse_mapping(line)?;
            mapping.insert(symbol, glyph);
        }
    }

    if mapping.is_empty() {
        return Err(LevelError::NoMapping);
    }

    let spacing_x = SOLO_BRICK_WIDTH + SOLO_BRICK_GAP;
    let spacing_y = SOLO_BRICK_HEIGHT + SOLO_BRICK_GAP;
    let mut bricks = Vec::new();

    for (row, raw) in rows.iter().enumerate() {
        let line = unquote(raw);
        let cells: Vec<char> = line.chars().collect();
        if cells.is_empty() {
            continue;
        }

        // The last cell of every row lands one brick-width from the far wall
        let start_x = field_width
            - SOLO_BRICK_WIDTH
            - SOLO_BRICK_WIDTH
            - (cells.len() as f32 - 1.0) * spacing_x;
        let y = SOLO_TOP_MARGIN + row as f32 * spacing_y;

        for (col, symbol) in cells.iter().enumerate() {
            let Some(glyph) = mapping.get(symbol) else {
                continue;
            };
            let x = start_x + col as f32 * spacing_x;
            if x < SOLO_PADDLE_ZONE {
                continue;
            }
            let mut brick = BrickDef::new(x, y, SOLO_BRICK_WIDTH, SOLO_BRICK_HEIGHT, glyph.health);
            brick.indestructible = glyph.indestructible;
            bricks.push(brick);
        }
    }

    Ok(BrickLayout::new(bricks))
}

/// Parse `C = <health|indestructible> [#color]`
fn parse_mapping(line: &str) -> Result<(char, Glyph), LevelError> {
    let bad = || LevelError::BadMapping(line.trim().to_string());

    let mut chars = line.chars();
    let symbol = chars.next().ok_or_else(bad)?;
    let rest = chars.as_str().trim_start();
    let value = rest.strip_prefix('=').ok_or_else(bad)?.trim();
    let word = value.split_whitespace().next().ok_or_else(bad)?;

    let glyph = if word == "indestructible" {
        Glyph {
            health: 1,
            indestructible: true,
        }
    } else {
        let health: u32 = word.parse().map_err(|_| bad())?;
        if health == 0 {
            return Err(bad());
        }
        Glyph {
            health,
            indestructible: false,
        }
    };
    Ok((symbol, glyph))
}

fn unquote(line: &str) -> &str {
    if line.len() >= 2 && line.starts_with('\'') && line.ends_with('\'') {
        &line[1..line.len() - 1]
    } else {
        line
    }
}

/// Levels shipped with the game
pub(crate) const BUILTIN_LEVELS: &[&str] = &[
    "# MAPPING
A = 1 #ffd166
B = 2 #ef476f
# ENDMAPPING

# LEVEL
'AAAAAAAAAA'
'ABBBBBBBBA'
'AB      BA'
'AB      BA'
'ABBBBBBBBA'
'AAAAAAAAAA'
# ENDLEVEL",
    "# MAPPING
X = 1 #ff9ff3
Y = 2 #54a0ff
Z = 3 #5f27cd
I = indestructible #2f3542
# ENDMAPPING

# LEVEL
'XXXXXXXXXXX'
'X         X'
'X  YYYYY  X'
'X  YZZZY  X'
'X  YZIZY  X'
'X  YZZZY  X'
'X  YYYYY  X'
'X         X'
'XXXXXXXXXXX'
# ENDLEVEL",
    "# MAPPING
A = 1 #fdcb6e
B = 2 #e17055
C = 3 #74b9ff
D = 4 #a29bfe
I = indestructible #636e72
# ENDMAPPING

# LEVEL
'     A     '
'    AAA    '
'   AABAA   '
'  AABBBAA  '
' AABBCBBAA '
'AABBCDCBBAA'
' AABBCBBAA '
'  AABIBAA  '
'   AABAA   '
'    AAA    '
'     A     '
# ENDLEVEL",
];

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "# MAPPING
A = 2 #ff0000
I = indestructible #888888
# ENDMAPPING

# LEVEL
'AIA '
 A
# ENDLEVEL";

    #[test]
    fn test_parse_mapping_and_rows() {
        let layout = parse_level(SAMPLE, 800.0).expect("sample parses");
        assert_eq!(layout.bricks.len(), 4);
        assert_eq!(layout.destructible_count(), 3);

        let wall = layout.bricks.iter().find(|b| b.indestructible).expect("wall");
        assert_eq!(wall.health, 1);
        assert!(layout
            .bricks
            .iter()
            .filter(|b| !b.indestructible)
            .all(|b| b.health == 2));
    }

    #[test]
    fn test_quoted_trailing_spaces_shift_row() {
        let layout = parse_level(SAMPLE, 800.0).expect("sample parses");
        let spacing = SOLO_BRICK_WIDTH + SOLO_BRICK_GAP;
        // Row 0 has four cells (one trailing space), so its last brick sits a
        // full cell to the left of where it would without the quote.
        let row0_last = layout
            .bricks
            .iter()
            .filter(|b| b.y == SOLO_TOP_MARGIN)
            .map(|b| b.x)
            .fold(f32::MIN, f32::max);
        let right_edge = 800.0 - 2.0 * SOLO_BRICK_WIDTH;
        assert!((row0_last - (right_edge - spacing)).abs() < 1e-3);
    }

    #[test]
    fn test_paddle_zone_is_kept_clear() {
        let wide = format!(
            "# MAPPING\nA = 1\n# ENDMAPPING\n# LEVEL\n{}\n# ENDLEVEL",
            "A".repeat(40)
        );
        let layout = parse_level(&wide, 800.0).expect("parses");
        assert!(!layout.bricks.is_empty());
        assert!(layout.bricks.iter().all(|b| b.x >= SOLO_PADDLE_ZONE));
        assert!(layout.bricks.len() < 40);
    }

    #[test]
    fn test_bad_mapping_is_an_error() {
        let content = "# MAPPING\nA = lots\n# ENDMAPPING\n# LEVEL\nA\n# ENDLEVEL";
        assert!(matches!(
            parse_level(content, 800.0),
            Err(LevelError::BadMapping(_))
        ));
        let content = "# MAPPING\nA = 0\n# ENDMAPPING\n# LEVEL\nA\n# ENDLEVEL";
        assert!(parse_level(content, 800.0).is_err());
    }

    #[test]
    fn test_missing_mapping_is_an_error() {
        assert_eq!(
            parse_level("# LEVEL\nAAA\n# ENDLEVEL", 800.0),
            Err(LevelError::NoMapping)
        );
    }
}
