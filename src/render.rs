//! SVG snapshots of the visible map, one file per turn.
//!
//! Hexes are drawn flat-top. Terrain fills the tiles, home cells get a blue
//! outline and the spawn a star. Food, enemies, own agents and the moves
//! planned this turn are layered on top.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::hex::{HexCoord, SQRT_3};
use crate::types::{Move, Snapshot, TerrainType, UnitKind};

const HEX_SIZE: f64 = 20.0;
const MARGIN: f64 = 30.0;
const TITLE_HEIGHT: f64 = 28.0;

fn terrain_fill(terrain: TerrainType) -> &'static str {
    match terrain {
        TerrainType::Home => "#FFD700",
        TerrainType::Empty => "#FFFFFF",
        TerrainType::Mud => "#A0522D",
        TerrainType::Acid => "#90EE90",
        TerrainType::Rock => "#808080",
    }
}

fn food_fill(kind: u8) -> &'static str {
    match kind {
        1 => "#FF0000",
        2 => "#FFA500",
        3 => "#FFC0CB",
        _ => "#E0E0E0",
    }
}

fn kind_letter(kind: UnitKind) -> char {
    match kind {
        UnitKind::Worker => 'W',
        UnitKind::Fighter => 'F',
        UnitKind::Scout => 'S',
    }
}

fn to_pixel(cell: HexCoord) -> (f64, f64) {
    let x = HEX_SIZE * 1.5 * f64::from(cell.q);
    let y = HEX_SIZE * (SQRT_3 / 2.0 * f64::from(cell.q) + SQRT_3 * f64::from(cell.r));
    (x, y)
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Pixel bounds `(min_x, min_y, max_x, max_y)` of everything drawn.
fn bounds(snapshot: &Snapshot, moves: &[Move]) -> (f64, f64, f64, f64) {
    let cells = snapshot
        .tiles
        .iter()
        .map(|tile| tile.pos())
        .chain(snapshot.home.iter().copied())
        .chain(snapshot.agents.iter().map(|agent| agent.pos()))
        .chain(snapshot.enemies.iter().map(|enemy| enemy.pos()))
        .chain(snapshot.food.iter().map(|food| food.pos()))
        .chain(moves.iter().flat_map(|mv| mv.path.iter().copied()));

    let mut extent: Option<(f64, f64, f64, f64)> = None;
    for cell in cells {
        let (x, y) = to_pixel(cell);
        extent = Some(match extent {
            None => (x, y, x, y),
            Some((min_x, min_y, max_x, max_y)) => {
                (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
            }
        });
    }
    extent.unwrap_or((0.0, 0.0, 0.0, 0.0))
}

fn hexagon(out: &mut String, cell: HexCoord, fill: &str, stroke: &str, stroke_width: f64) {
    let (cx, cy) = to_pixel(cell);
    let points: Vec<String> = (0..6)
        .map(|corner| {
            let angle = (60.0 * f64::from(corner)).to_radians();
            format!(
                "{:.1},{:.1}",
                cx + HEX_SIZE * angle.cos(),
                cy + HEX_SIZE * angle.sin()
            )
        })
        .collect();
    out.push_str(&format!(
        "<polygon points=\"{}\" fill=\"{fill}\" stroke=\"{stroke}\" stroke-width=\"{stroke_width}\"/>\n",
        points.join(" ")
    ));
}

fn label(out: &mut String, (x, y): (f64, f64), text: &str, color: &str, size: u32) {
    out.push_str(&format!(
        "<text x=\"{x:.1}\" y=\"{y:.1}\" fill=\"{color}\" font-size=\"{size}\" \
         font-family=\"monospace\" text-anchor=\"middle\" dominant-baseline=\"middle\">{}</text>\n",
        escape(text)
    ));
}

/// Renders one turn: the snapshot plus the moves decided for it.
pub fn render_svg(snapshot: &Snapshot, moves: &[Move]) -> String {
    let (min_x, min_y, max_x, max_y) = bounds(snapshot, moves);
    let origin_x = min_x - HEX_SIZE - MARGIN;
    let origin_y = min_y - HEX_SIZE - MARGIN - TITLE_HEIGHT;
    let width = max_x - min_x + 2.0 * (HEX_SIZE + MARGIN);
    let height = max_y - min_y + 2.0 * (HEX_SIZE + MARGIN) + TITLE_HEIGHT;

    let mut out = String::new();
    out.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"{origin_x:.1} {origin_y:.1} {width:.1} {height:.1}\" \
         width=\"{width:.0}\" height=\"{height:.0}\">\n"
    ));
    out.push_str(&format!(
        "<rect x=\"{origin_x:.1}\" y=\"{origin_y:.1}\" width=\"{width:.1}\" height=\"{height:.1}\" fill=\"#F4F4F4\"/>\n"
    ));
    label(
        &mut out,
        (origin_x + width / 2.0, origin_y + TITLE_HEIGHT / 2.0 + 4.0),
        &format!(
            "Turn {} | score {} | {} moves",
            snapshot.turn,
            snapshot.score.unwrap_or(0),
            moves.len()
        ),
        "#000000",
        16,
    );

    for tile in &snapshot.tiles {
        hexagon(&mut out, tile.pos(), terrain_fill(tile.terrain), "#000000", 1.0);
    }
    for &cell in &snapshot.home {
        hexagon(&mut out, cell, terrain_fill(TerrainType::Home), "#0000FF", 3.0);
    }
    if let Some(spawn) = snapshot.spawn {
        label(&mut out, to_pixel(spawn), "\u{2605}", "#0000FF", 22);
    }

    for food in &snapshot.food {
        let (x, y) = to_pixel(food.pos());
        out.push_str(&format!(
            "<circle cx=\"{x:.1}\" cy=\"{y:.1}\" r=\"{:.1}\" fill=\"{}\" stroke=\"#000000\"/>\n",
            HEX_SIZE * 0.4,
            food_fill(food.kind)
        ));
        label(&mut out, (x, y + HEX_SIZE * 0.65), &food.amount.to_string(), "#000000", 9);
    }

    for mv in moves {
        let Some(agent) = snapshot.agents.iter().find(|agent| agent.id == mv.agent_id) else {
            continue;
        };
        let points: Vec<String> = std::iter::once(agent.pos())
            .chain(mv.path.iter().copied())
            .map(|cell| {
                let (x, y) = to_pixel(cell);
                format!("{x:.1},{y:.1}")
            })
            .collect();
        out.push_str(&format!(
            "<polyline points=\"{}\" fill=\"none\" stroke=\"#0000FF\" stroke-width=\"2\" stroke-opacity=\"0.7\"/>\n",
            points.join(" ")
        ));
    }

    for enemy in &snapshot.enemies {
        let (x, y) = to_pixel(enemy.pos());
        label(
            &mut out,
            (x, y - HEX_SIZE * 0.3),
            &format!("E-{}", kind_letter(enemy.kind)),
            "#FF0000",
            11,
        );
        label(&mut out, (x, y + HEX_SIZE * 0.3), &enemy.health.to_string(), "#FF0000", 8);
    }

    for agent in &snapshot.agents {
        let (x, y) = to_pixel(agent.pos());
        out.push_str(&format!("<g><title>{}</title>\n", escape(&agent.id)));
        label(
            &mut out,
            (x, y - HEX_SIZE * 0.3),
            &kind_letter(agent.kind).to_string(),
            "#0000FF",
            12,
        );
        label(&mut out, (x, y + HEX_SIZE * 0.3), &agent.health.to_string(), "#0000FF", 8);
        if agent.is_carrying() {
            let food_kind = agent.food.as_ref().map_or(0, |food| food.kind);
            out.push_str(&format!(
                "<circle cx=\"{:.1}\" cy=\"{y:.1}\" r=\"{:.1}\" fill=\"{}\"/>\n",
                x + HEX_SIZE * 0.45,
                HEX_SIZE * 0.2,
                food_fill(food_kind)
            ));
        }
        out.push_str("</g>\n");
    }

    out.push_str("</svg>\n");
    out
}

/// Writes `turn_<NNN>.svg` into `dir`, creating it if needed.
pub fn write_turn_svg(
    dir: impl AsRef<Path>,
    snapshot: &Snapshot,
    moves: &[Move],
) -> io::Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("turn_{:03}.svg", snapshot.turn));
    fs::write(&path, render_svg(snapshot, moves))?;
    Ok(path)
}
