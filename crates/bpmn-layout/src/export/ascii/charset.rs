//! Line-drawing characters and junction merging.

/// Which characters boxes and flows are drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CharSet {
    /// Box-drawing characters (`┌─┐│`) and filled arrow heads.
    #[default]
    Unicode,
    /// Plain `+-|` and `><v^`.
    Ascii,
}

/// The characters of one [`CharSet`].
#[derive(Debug, Clone, Copy)]
pub struct BoxChars {
    pub top_left: char,
    pub top_right: char,
    pub bottom_left: char,
    pub bottom_right: char,
    pub horizontal: char,
    pub vertical: char,
    pub arrow_right: char,
    pub arrow_left: char,
    pub arrow_down: char,
    pub arrow_up: char,
}

const UNICODE: BoxChars = BoxChars {
    top_left: '┌',
    top_right: '┐',
    bottom_left: '└',
    bottom_right: '┘',
    horizontal: '─',
    vertical: '│',
    arrow_right: '►',
    arrow_left: '◄',
    arrow_down: '▼',
    arrow_up: '▲',
};

const ASCII: BoxChars = BoxChars {
    top_left: '+',
    top_right: '+',
    bottom_left: '+',
    bottom_right: '+',
    horizontal: '-',
    vertical: '|',
    arrow_right: '>',
    arrow_left: '<',
    arrow_down: 'v',
    arrow_up: '^',
};

impl CharSet {
    pub fn chars(self) -> &'static BoxChars {
        match self {
            Self::Unicode => &UNICODE,
            Self::Ascii => &ASCII,
        }
    }
}

/// Directions a line character connects to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Arms {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl Arms {
    pub fn new(up: bool, down: bool, left: bool, right: bool) -> Self {
        Self {
            up,
            down,
            left,
            right,
        }
    }

    /// Arms of a line character; `None` for anything else.
    pub fn from_char(c: char) -> Option<Self> {
        let arms = match c {
            '─' | '-' => Self::new(false, false, true, true),
            '│' | '|' => Self::new(true, true, false, false),
            '┌' => Self::new(false, true, false, true),
            '┐' => Self::new(false, true, true, false),
            '└' => Self::new(true, false, false, true),
            '┘' => Self::new(true, false, true, false),
            '├' => Self::new(true, true, false, true),
            '┤' => Self::new(true, true, true, false),
            '┬' => Self::new(false, true, true, true),
            '┴' => Self::new(true, false, true, true),
            '┼' | '+' => Self::new(true, true, true, true),
            _ => return None,
        };
        Some(arms)
    }

    pub fn merge(self, other: Self) -> Self {
        Self {
            up: self.up || other.up,
            down: self.down || other.down,
            left: self.left || other.left,
            right: self.right || other.right,
        }
    }

    /// The character with exactly these arms. A single arm reads as a
    /// straight line.
    pub fn to_char(self, charset: CharSet) -> char {
        if charset == CharSet::Ascii {
            return match (self.up || self.down, self.left || self.right) {
                (true, true) => '+',
                (true, false) => '|',
                (false, true) => '-',
                (false, false) => ' ',
            };
        }
        match (self.up, self.down, self.left, self.right) {
            (false, false, false, false) => ' ',
            (_, _, false, false) => '│',
            (false, false, _, _) => '─',
            (false, true, false, true) => '┌',
            (false, true, true, false) => '┐',
            (true, false, false, true) => '└',
            (true, false, true, false) => '┘',
            (true, true, false, true) => '├',
            (true, true, true, false) => '┤',
            (false, true, true, true) => '┬',
            (true, false, true, true) => '┴',
            (true, true, true, true) => '┼',
        }
    }
}
