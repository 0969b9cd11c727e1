use super::*;
use rand::prelude::*;
use std::collections::HashSet;

fn board_with(size: u16, player: Player, points: &[(i16, i16)]) -> Board {
    let mut board = Board::new(size);
    for &(x, y) in points {
        board.set(Point::new(x, y), player);
    }
    board
}

fn place(board: &mut Board, player: Player, x: i16, y: i16) -> Vec<Square> {
    let p = Point::new(x, y);
    board.set(p, player);
    find_new_squares(board, p, player)
}

fn pts(points: [(i16, i16); 4]) -> [Point; 4] {
    canonicalize(points.map(|(x, y)| Point::new(x, y)))
}

/// Returns the squared side length if the points form a square.
fn square_side(points: [Point; 4]) -> Option<u32> {
    let mut dists = vec![];
    for i in 0..4 {
        for j in i + 1..4 {
            dists.push((points[i] - points[j]).norm_squared());
        }
    }
    dists.sort_unstable();
    let side = dists[0];
    let is_square = side > 0
        && dists[..4].iter().all(|&d| d == side)
        && dists[4..].iter().all(|&d| d == 2 * side);
    is_square.then_some(side)
}

#[ignore]
#[test]
fn test_pairing() {
    for z in 0..=u32::MAX {
        let (x, y) = szudzik_unpair(z);
        assert_eq!(z, szudzik_pair(x, y));
    }
}

#[test]
fn test_point_index_on_board() {
    for x in 0..MAX_GRID_SIZE as i16 {
        for y in 0..MAX_GRID_SIZE as i16 {
            let p = Point::new(x, y);
            assert_eq!(Point::from_index(p.index()), p);
        }
    }
}

#[test]
fn test_config_bounds() {
    assert_eq!(Config::new(1, 100), Err(ConfigError::GridSize(1)));
    assert_eq!(Config::new(257, 100), Err(ConfigError::GridSize(257)));
    assert_eq!(Config::new(10, 0), Err(ConfigError::TargetScore));
    assert_eq!(Config::new(10, 100), Ok(Config::default()));

    let mut buf = vec![];
    Config::new(2, 7).unwrap().encode(&mut buf);
    assert_eq!(buf, [2, 7]);
    assert_eq!(Config::decode(&mut &buf[..]), Config::new(2, 7).ok());
    assert_eq!(Config::decode(&mut &[1, 7][..]), None);
}

#[test]
fn test_board_bounds() {
    let mut board = Board::new(3);
    assert!(board.contains(Point::new(2, 2)));
    assert!(!board.contains(Point::new(3, 0)));
    assert!(!board.contains(Point::new(0, -1)));
    assert!(!board.is_vacant(Point::new(-1, 0)));

    board.set(Point::new(5, 5), Player::Red);
    assert!(board.is_empty());

    board.set(Point::new(1, 2), Player::Blue);
    assert_eq!(board.get(Point::new(1, 2)), Some(Player::Blue));
    assert!(!board.is_vacant(Point::new(1, 2)));
    assert_eq!(
        board.occupied().collect::<Vec<_>>(),
        [(Point::new(1, 2), Player::Blue)]
    );
}

#[test]
fn test_player_slots_leader() {
    assert_eq!(PlayerSlots::new(3, 2).leader(), Some(Player::Red));
    assert_eq!(PlayerSlots::new(3, 4).leader(), Some(Player::Blue));
    assert_eq!(PlayerSlots::new(5, 5).leader(), None);
}

#[test]
fn test_unit_square() {
    let mut board = Board::new(10);
    assert!(place(&mut board, Player::Red, 0, 0).is_empty());
    assert!(place(&mut board, Player::Red, 1, 0).is_empty());
    assert!(place(&mut board, Player::Red, 0, 1).is_empty());

    let squares = place(&mut board, Player::Red, 1, 1);
    assert_eq!(squares.len(), 1);
    assert_eq!(squares[0].vertices(), pts([(0, 0), (1, 0), (0, 1), (1, 1)]));
    assert_eq!(squares[0].score(), 1);
    assert_eq!(squares[0].player(), Player::Red);
}

#[test]
fn test_tilted_square_from_every_vertex() {
    // Side vector (2, 1).
    let corners = [(1, 0), (3, 1), (2, 3), (0, 2)];

    for last in 0..4 {
        let others: Vec<_> = (0..4).filter(|&i| i != last).map(|i| corners[i]).collect();
        let mut board = board_with(10, Player::Blue, &others);

        let (x, y) = corners[last];
        let squares = place(&mut board, Player::Blue, x, y);
        assert_eq!(squares.len(), 1, "last vertex {:?}", corners[last]);
        assert_eq!(squares[0].vertices(), pts(corners));
        assert_eq!(squares[0].score(), 5);
    }
}

#[test]
fn test_diamond_score() {
    // A diamond around (1, 1) with side vector (1, 1).
    let mut board = board_with(3, Player::Red, &[(1, 0), (0, 1), (2, 1)]);
    let squares = place(&mut board, Player::Red, 1, 2);
    assert_eq!(squares.len(), 1);
    assert_eq!(squares[0].score(), 2);
}

#[test]
fn test_two_squares_in_one_ply() {
    let mut board = board_with(10, Player::Red, &[(0, 0), (1, 0), (0, 1), (2, 0), (2, 1)]);
    let squares = place(&mut board, Player::Red, 1, 1);

    let keys: HashSet<_> = squares.iter().map(Square::vertices).collect();
    assert_eq!(
        keys,
        HashSet::from([
            pts([(0, 0), (1, 0), (0, 1), (1, 1)]),
            pts([(1, 0), (2, 0), (1, 1), (2, 1)]),
        ])
    );
    assert_eq!(squares.iter().map(Square::score).sum::<u32>(), 2);
}

#[test]
fn test_axis_and_tilted_sharing_a_vertex() {
    let mut board = board_with(10, Player::Red, &[(2, 2), (1, 3), (0, 2), (2, 1), (1, 2)]);
    let squares = place(&mut board, Player::Red, 1, 1);

    assert_eq!(squares.len(), 2);
    let mut scores: Vec<_> = squares.iter().map(Square::score).collect();
    scores.sort_unstable();
    assert_eq!(scores, [1, 2]);
}

#[test]
fn test_ignores_other_player_and_off_board() {
    let mut board = board_with(10, Player::Red, &[(0, 0), (1, 0)]);
    board.set(Point::new(0, 1), Player::Blue);
    assert!(place(&mut board, Player::Red, 1, 1).is_empty());

    // Only one side of an edge along the border lies on the board.
    let mut board = board_with(2, Player::Red, &[(0, 0)]);
    assert!(place(&mut board, Player::Red, 0, 1).is_empty());
}

#[test]
fn test_lone_point() {
    let mut board = board_with(10, Player::Blue, &[(4, 4), (5, 5)]);
    assert!(place(&mut board, Player::Red, 0, 0).is_empty());
}

#[test]
fn test_canonicalize_idempotent() {
    let v = [(3, 1), (0, 2), (2, 3), (1, 0)].map(|(x, y)| Point::new(x, y));
    let once = canonicalize(v);
    assert_eq!(canonicalize(once), once);
    assert_eq!(once[0], Point::new(0, 2));
}

#[test]
fn test_outline_goes_around() {
    let mut board = board_with(10, Player::Red, &[(1, 0), (3, 1), (2, 3)]);
    let square = place(&mut board, Player::Red, 0, 2)[0];
    let outline = square.outline();
    for i in 0..4 {
        let side = (outline[(i + 1) % 4] - outline[i]).norm_squared();
        assert_eq!(side, square.score());
    }
}

#[test]
fn test_matches_brute_force() {
    let mut rng = rand::rng();

    for _ in 0..300 {
        let size = rng.random_range(2..8);
        let player = Player::VALUES[rng.random_range(0..2)];
        let mut board = Board::new(size);
        for x in 0..size as i16 {
            for y in 0..size as i16 {
                if rng.random_bool(0.4) {
                    let owner = if rng.random_bool(0.8) {
                        player
                    } else {
                        player.opposite()
                    };
                    board.set(Point::new(x, y), owner);
                }
            }
        }

        let p = Point::new(
            rng.random_range(0..size as i16),
            rng.random_range(0..size as i16),
        );
        board.set(p, player);
        let mine: Vec<_> = board
            .occupied()
            .filter(|&(q, owner)| owner == player && q != p)
            .map(|(q, _)| q)
            .collect();

        let mut expected = HashSet::new();
        for i in 0..mine.len() {
            for j in i + 1..mine.len() {
                for k in j + 1..mine.len() {
                    let v = canonicalize([p, mine[i], mine[j], mine[k]]);
                    if let Some(side) = square_side(v) {
                        expected.insert((v, side));
                    }
                }
            }
        }

        let squares = find_new_squares(&board, p, player);
        let found: HashSet<_> = squares.iter().map(|s| (s.vertices(), s.score())).collect();
        assert_eq!(found.len(), squares.len(), "duplicate square");
        assert_eq!(found, expected);

        for square in &squares {
            let v = square.vertices();
            assert_eq!(v.iter().collect::<HashSet<_>>().len(), 4);
            assert!(square.contains(p));
            assert!(v.iter().all(|&q| board.get(q) == Some(player)));
        }
    }
}
