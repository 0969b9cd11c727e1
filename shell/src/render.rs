//! Text rendering of a match.

use squarewars_core::{
    game::{Board, Player, Point},
    state::{MatchState, Status},
};
use std::{collections::HashSet, fmt::Write};

const RED: &str = "\x1b[91m";
const BLUE: &str = "\x1b[94m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Whether to emit ANSI escape codes.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Palette {
    /// Colored output.
    #[default]
    Ansi,
    /// Plain text.
    Plain,
}

impl Palette {
    fn paint(self, code: &'static str, text: &str) -> String {
        match self {
            Self::Ansi => format!("{code}{text}{RESET}"),
            Self::Plain => text.into(),
        }
    }

    fn player(self, player: Player, text: &str) -> String {
        let code = match player {
            Player::Red => RED,
            Player::Blue => BLUE,
        };
        self.paint(code, text)
    }
}

fn marker(player: Player) -> char {
    match player {
        Player::Red => 'R',
        Player::Blue => 'B',
    }
}

/// Renders the board, scores, and status line.
///
/// Columns are `x` and rows are `y`. Markers belonging to the squares
/// completed by the latest ply are bracketed.
#[must_use]
pub fn render(state: &MatchState, palette: Palette) -> String {
    let board = state.board();
    let n = board.size() as i16;
    let highlighted: HashSet<Point> = state
        .last_squares()
        .iter()
        .flat_map(|square| square.vertices())
        .collect();

    let label_width = (n - 1).to_string().len();
    let mut out = String::new();

    _ = write!(out, "{:label_width$} ", "");
    for x in 0..n {
        _ = write!(out, "{}", palette.paint(DIM, &format!("{x:^3}")));
    }
    out.push('\n');

    for y in 0..n {
        _ = write!(out, "{} ", palette.paint(DIM, &format!("{y:>label_width$}")));
        for x in 0..n {
            let p = Point::new(x, y);
            let cell = match board.get(p) {
                None => palette.paint(DIM, " · "),
                Some(player) if highlighted.contains(&p) => {
                    let text = format!("[{}]", marker(player));
                    palette.player(player, &palette.paint(BOLD, &text))
                }
                Some(player) => palette.player(player, &format!(" {} ", marker(player))),
            };
            out.push_str(&cell);
        }
        out.push('\n');
    }

    out.push_str(&scoreboard(state, palette));
    out.push('\n');
    out.push_str(&status_line(state, palette));
    out.push('\n');
    out
}

/// Renders the scores and the goal on one line.
#[must_use]
pub fn scoreboard(state: &MatchState, palette: Palette) -> String {
    let scores = state.scores();
    let [red, blue] = Player::VALUES.map(|player| {
        palette.player(player, &format!("{player} {}", scores[player]))
    });
    format!("{red} | {blue} | GOAL {}", state.config().target_score())
}

/// Renders the status line.
#[must_use]
pub fn status_line(state: &MatchState, palette: Palette) -> String {
    let turn = palette.player(state.turn(), &state.turn().to_string());
    match state.status() {
        Status::InProgress => format!("TURN: {turn}"),
        Status::LastChance => format!("{} TURN: {turn}", palette.paint(BOLD, "LAST CHANCE!")),
        Status::Over(Some(winner)) => palette.paint(BOLD, &format!("GAME OVER • {winner} WINS!")),
        Status::Over(None) => palette.paint(BOLD, "GAME OVER • DRAW"),
    }
}

/// Renders a notice.
#[must_use]
pub fn toast(text: &str, palette: Palette) -> String {
    palette.paint(BOLD, &format!("» {text}"))
}

/// Renders a compact plain-text picture of the board, one row per line.
#[must_use]
pub fn thumbnail(board: &Board) -> Vec<u8> {
    let n = board.size() as i16;
    let mut buf = Vec::with_capacity(board.size() as usize * (board.size() as usize + 1));
    for y in 0..n {
        if y > 0 {
            buf.push(b'\n');
        }
        for x in 0..n {
            buf.push(match board.get(Point::new(x, y)) {
                None => b'.',
                Some(Player::Red) => b'R',
                Some(Player::Blue) => b'B',
            });
        }
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use squarewars_core::game::Config;

    fn play(config: Config, points: &[(i16, i16)]) -> MatchState {
        let mut state = MatchState::new(config);
        for &(x, y) in points {
            state.place(Point::new(x, y)).unwrap();
        }
        state
    }

    #[test]
    fn test_empty_board() {
        let state = MatchState::new(Config::new(3, 5).unwrap());
        assert_eq!(
            render(&state, Palette::Plain),
            "   0  1  2 \n\
             0  ·  ·  · \n\
             1  ·  ·  · \n\
             2  ·  ·  · \n\
             RED 0 | BLUE 0 | GOAL 5\n\
             TURN: RED\n"
        );
    }

    #[test]
    fn test_highlights_last_squares() {
        let state = play(
            Config::new(3, 5).unwrap(),
            &[(0, 0), (2, 2), (1, 0), (2, 1), (0, 1), (2, 0), (1, 1)],
        );
        let text = render(&state, Palette::Plain);
        let rows: Vec<_> = text.lines().collect();
        assert_eq!(rows[1], "0 [R][R] B ");
        assert_eq!(rows[2], "1 [R][R] B ");
        assert_eq!(rows[3], "2  ·  ·  B ");
        assert_eq!(rows[4], "RED 1 | BLUE 0 | GOAL 5");
        assert_eq!(rows[5], "TURN: BLUE");
    }

    #[test]
    fn test_status_lines() {
        let config = Config::new(4, 1).unwrap();
        let mut state = play(config, &[(0, 0), (3, 3), (1, 0), (3, 2), (0, 1), (3, 1), (1, 1)]);
        assert_eq!(status_line(&state, Palette::Plain), "LAST CHANCE! TURN: BLUE");

        state.place(Point::new(2, 3)).unwrap();
        assert_eq!(status_line(&state, Palette::Plain), "GAME OVER • RED WINS!");

        let mut state = play(config, &[(0, 0), (2, 0), (1, 0), (3, 0), (0, 1), (2, 1), (1, 1)]);
        state.place(Point::new(3, 1)).unwrap();
        assert_eq!(status_line(&state, Palette::Plain), "GAME OVER • DRAW");
    }

    #[test]
    fn test_ansi_wraps_markers() {
        let state = play(Config::default(), &[(0, 0)]);
        let text = render(&state, Palette::Ansi);
        assert!(text.contains(&format!("{RED} R {RESET}")));
        assert!(status_line(&state, Palette::Ansi).contains(BLUE));
    }

    #[test]
    fn test_toast() {
        assert_eq!(toast("board cleared", Palette::Plain), "» board cleared");
        assert_eq!(
            toast("+1 points", Palette::Ansi),
            format!("{BOLD}» +1 points{RESET}")
        );
    }

    #[test]
    fn test_thumbnail() {
        let state = play(Config::new(3, 5).unwrap(), &[(0, 0), (2, 1)]);
        assert_eq!(thumbnail(state.board()), b"R..\n..B\n...");
    }
}
