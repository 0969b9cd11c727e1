use super::{Board, Player, Point};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Sorts the vertices of a square into its canonical vertex set.
#[must_use]
pub fn canonicalize(mut vertices: [Point; 4]) -> [Point; 4] {
    vertices.sort_unstable();
    vertices
}

/// A square whose four vertices are occupied by the same player.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Square {
    vertices: [Point; 4],
    player: Player,
    score: u32,
}

impl Square {
    /// Returns the canonical vertex set of the square.
    #[must_use]
    pub fn vertices(&self) -> [Point; 4] {
        self.vertices
    }

    /// Returns the vertices in drawing order, going around the square.
    #[must_use]
    pub fn outline(&self) -> [Point; 4] {
        // The lexicographically smallest and largest vertices are opposite.
        let [a, b, c, d] = self.vertices;
        [a, b, d, c]
    }

    /// Returns the player owning the square.
    #[must_use]
    pub fn player(&self) -> Player {
        self.player
    }

    /// Returns the score of the square, its squared side length.
    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Tests if the point is a vertex of the square.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        self.vertices.contains(&p)
    }
}

/// Finds every square completed by `player` placing at `p`.
///
/// `p` must already be occupied by `player` on `board`. Each returned
/// square has `p` as a vertex and appears exactly once, no matter how many
/// vertex pairings lead to it.
#[must_use]
pub fn find_new_squares(board: &Board, p: Point, player: Player) -> Vec<Square> {
    let mut seen = HashSet::new();
    let mut squares = vec![];

    let mut complete = |q: Point, r: Point, s: Point, score: u32| {
        if board.get(r) != Some(player) || board.get(s) != Some(player) {
            return;
        }
        let vertices = canonicalize([p, q, r, s]);
        if seen.insert(vertices) {
            squares.push(Square {
                vertices,
                player,
                score,
            });
        }
    };

    for (q, _) in board
        .occupied()
        .filter(|&(q, owner)| owner == player && q != p)
    {
        let d = q - p;
        let side = d.norm_squared();

        // `p` and `q` as adjacent vertices, on either side of the edge.
        let n = d.rotate_ccw();
        complete(q, q + n, p + n, side);
        complete(q, q - n, p - n, side);

        // `p` and `q` as opposite vertices. The other diagonal is
        // on the lattice only when both sums below are even.
        let sx = p.x + q.x + p.y - q.y;
        let sy = p.y + q.y + q.x - p.x;
        if sx % 2 == 0 && sy % 2 == 0 {
            let r = Point::new(sx / 2, sy / 2);
            let s = Point::new((p.x + q.x - p.y + q.y) / 2, (p.y + q.y - q.x + p.x) / 2);
            complete(q, r, s, side / 2);
        }
    }

    if !squares.is_empty() {
        tracing::trace!(?p, %player, count = squares.len(), "squares completed");
    }
    squares
}
