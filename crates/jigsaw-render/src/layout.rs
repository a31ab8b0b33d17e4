//! Exact per-piece poses from the combinatorial layout.
//!
//! Every adjacency contributes a relative pose constraint (from
//! aligning the two abutting edge curves) and every border-facing flat
//! edge contributes an absolute constraint against the canvas frame.
//! The constraint stacks are solved as three independent least-squares
//! systems, one for rotation and one per translation axis, after a
//! coarse per-piece base rotation is factored out.

use std::collections::BTreeMap;
use std::collections::HashMap;

use nalgebra::Vector2;

use jigsaw_core::{
    line_align, norm_angle, shape_align, EdgeId, LinearSystem, PieceId, PieceSet, RigidTransform,
    DIRECTIONS,
};
use jigsaw_solve::PuzzleLayout;

use crate::RenderError;

/// Pixel size of the assembled image and the rigid pose of every
/// piece, mapping piece-local coordinates onto the canvas.
#[derive(Clone, Debug)]
pub struct GeometricLayout {
    pub width: f64,
    pub height: f64,
    pub poses: BTreeMap<PieceId, RigidTransform>,
}

/// Variables of the translation systems: one per piece plus a virtual
/// variable carrying the canvas extent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum PoseVar {
    Piece(PieceId),
    Frame,
}

struct PieceDep {
    p1: PieceId,
    p2: PieceId,
    t: RigidTransform,
}

struct FrameDep {
    piece: PieceId,
    t: RigidTransform,
}

#[derive(Default)]
struct Dependencies {
    pieces: Vec<PieceDep>,
    /// Frame constraints bucketed by the outward direction
    /// (east, south, west, north).
    frame: [Vec<FrameDep>; 4],
}

fn collect_dependencies(
    set: &PieceSet,
    layout: &PuzzleLayout,
) -> (Dependencies, BTreeMap<PieceId, EdgeId>) {
    let mut deps = Dependencies::default();
    let mut top_edges = BTreeMap::new();

    for pos in layout.coords() {
        let Some(north) = *layout.at(pos) else {
            continue;
        };
        top_edges.insert(set.edge(north).piece, north);

        for (d, dir) in DIRECTIONS.iter().enumerate() {
            let neighbour = pos + dir;
            if layout.in_bounds(neighbour) {
                let Some(other_north) = *layout.at(neighbour) else {
                    continue;
                };
                // The edge of this piece facing direction d, and the
                // neighbour's edge facing back.
                let edge1 = set.advance(set.edge(north).next, d);
                let edge2 = set.advance(set.edge(other_north).prev, d);
                let t = shape_align(&set.edge(edge2).shape, &set.edge(edge1).shape).t;
                deps.pieces.push(PieceDep {
                    p1: set.edge(north).piece,
                    p2: set.edge(other_north).piece,
                    t,
                });
            } else {
                let edge = set.advance(set.edge(north).next, d);
                let target = (90.0 * (3 - d) as f64).to_radians();
                deps.frame[d].push(FrameDep {
                    piece: set.edge(north).piece,
                    t: line_align(&set.edge(edge).shape, target),
                });
            }
        }
    }
    (deps, top_edges)
}

/// Coarse per-piece rotation: align the north edge with the x axis.
fn base_rotations(set: &PieceSet, top_edges: &BTreeMap<PieceId, EdgeId>) -> HashMap<PieceId, f64> {
    top_edges
        .iter()
        .map(|(&piece, &edge)| (piece, line_align(&set.edge(edge).shape, 0.0).rotation))
        .collect()
}

/// Re-express all constraints after rotating every piece's local frame
/// by its angle.
fn rotate_dependencies(mut deps: Dependencies, angles: &HashMap<PieceId, f64>) -> Dependencies {
    for dep in &mut deps.pieces {
        let r1 = RigidTransform::rotation(-angles[&dep.p1]);
        let r2 = RigidTransform::rotation(angles[&dep.p2]);
        dep.t = r1.then(&dep.t).then(&r2);
    }
    for bucket in &mut deps.frame {
        for dep in bucket.iter_mut() {
            let r = RigidTransform::rotation(-angles[&dep.piece]);
            dep.t = r.then(&dep.t);
        }
    }
    deps
}

fn solve_rotations(deps: &Dependencies) -> Result<HashMap<PieceId, f64>, RenderError> {
    let mut system: LinearSystem<PieceId> = LinearSystem::new();
    for dep in &deps.pieces {
        system.add_difference(dep.p1, dep.p2, norm_angle(dep.t.rotation, 0.0));
    }
    for bucket in &deps.frame {
        for dep in bucket {
            system.add_value(dep.piece, norm_angle(dep.t.rotation, 0.0));
        }
    }
    system
        .solve()
        .ok_or(RenderError::PoseUnderdetermined { unknown: "rotation" })
}

/// One translation axis. `anchored` is the direction whose frame side
/// pins absolute coordinates (west for x, north for y); `extent` is
/// the opposite side, tied to the virtual frame variable.
fn solve_translations(
    deps: &Dependencies,
    anchored: usize,
    extent: usize,
    pick: impl Fn(&RigidTransform) -> f64,
) -> Result<HashMap<PoseVar, f64>, RenderError> {
    let mut system: LinearSystem<PoseVar> = LinearSystem::new();
    for dep in &deps.pieces {
        system.add_difference(PoseVar::Piece(dep.p1), PoseVar::Piece(dep.p2), pick(&dep.t));
    }
    for dep in &deps.frame[anchored] {
        system.add_value(PoseVar::Piece(dep.piece), pick(&dep.t));
    }
    for dep in &deps.frame[extent] {
        system.add_difference(PoseVar::Piece(dep.piece), PoseVar::Frame, pick(&dep.t));
    }
    system
        .solve()
        .ok_or(RenderError::PoseUnderdetermined { unknown: "translation" })
}

/// Compute the geometric layout of a solved puzzle.
pub fn compute_layout(
    set: &PieceSet,
    layout: &PuzzleLayout,
) -> Result<GeometricLayout, RenderError> {
    let (deps, top_edges) = collect_dependencies(set, layout);

    let base = base_rotations(set, &top_edges);
    let deps = rotate_dependencies(deps, &base);

    let rotation = solve_rotations(&deps)?;
    let deps = rotate_dependencies(deps, &rotation);

    // West and north frame sides anchor the absolute coordinates; the
    // east and south sides define the canvas extent.
    let xs = solve_translations(&deps, 2, 0, |t| t.translation.x)?;
    let ys = solve_translations(&deps, 3, 1, |t| t.translation.y)?;

    let width = *xs.get(&PoseVar::Frame).unwrap_or(&0.0);
    let height = *ys.get(&PoseVar::Frame).unwrap_or(&0.0);

    let poses = top_edges
        .keys()
        .map(|&piece| {
            let pose = RigidTransform::new(
                rotation[&piece] + base[&piece],
                Vector2::new(
                    xs[&PoseVar::Piece(piece)],
                    ys[&PoseVar::Piece(piece)],
                ),
            );
            (piece, pose)
        })
        .collect();

    Ok(GeometricLayout {
        width,
        height,
        poses,
    })
}
