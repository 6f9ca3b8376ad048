use crate::error::FolioError;
use crate::extraction::{BBox, PhysicalPage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How logical pages are laid out on one physical sheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionScheme {
    /// 2-up: left and right halves.
    Halves,
    /// 4-up: LT, RT, LB, RB.
    #[default]
    Quadrants,
    /// N full-height vertical strips, left to right.
    Strips(u8),
}

impl PartitionScheme {
    /// Partition ids in reading order.
    pub fn ids(&self) -> Vec<PartitionId> {
        match self {
            PartitionScheme::Halves => vec![PartitionId::Left, PartitionId::Right],
            PartitionScheme::Quadrants => vec![
                PartitionId::TopLeft,
                PartitionId::TopRight,
                PartitionId::BottomLeft,
                PartitionId::BottomRight,
            ],
            PartitionScheme::Strips(count) => (0..*count)
                .map(|index| PartitionId::Strip {
                    index,
                    count: *count,
                })
                .collect(),
        }
    }
}

/// Identity of one sub-region of a physical page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum PartitionId {
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Strip { index: u8, count: u8 },
}

impl PartitionId {
    /// Rectangle this partition covers on a page of the given size.
    pub fn region(&self, width: f32, height: f32) -> BBox {
        let (w2, h2) = (width / 2.0, height / 2.0);
        match self {
            PartitionId::Left => BBox::new(0.0, 0.0, w2, height),
            PartitionId::Right => BBox::new(w2, 0.0, width, height),
            PartitionId::TopLeft => BBox::new(0.0, 0.0, w2, h2),
            PartitionId::TopRight => BBox::new(w2, 0.0, width, h2),
            PartitionId::BottomLeft => BBox::new(0.0, h2, w2, height),
            PartitionId::BottomRight => BBox::new(w2, h2, width, height),
            PartitionId::Strip { index, count } => {
                let strip = width / f32::from((*count).max(1));
                let x0 = strip * f32::from(*index);
                BBox::new(x0, 0.0, x0 + strip, height)
            }
        }
    }
}

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartitionId::Left => write!(f, "L"),
            PartitionId::Right => write!(f, "R"),
            PartitionId::TopLeft => write!(f, "LT"),
            PartitionId::TopRight => write!(f, "RT"),
            PartitionId::BottomLeft => write!(f, "LB"),
            PartitionId::BottomRight => write!(f, "RB"),
            PartitionId::Strip { index, count } => write!(f, "S{index}/{count}"),
        }
    }
}

impl FromStr for PartitionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "L" => Ok(PartitionId::Left),
            "R" => Ok(PartitionId::Right),
            "LT" => Ok(PartitionId::TopLeft),
            "RT" => Ok(PartitionId::TopRight),
            "LB" => Ok(PartitionId::BottomLeft),
            "RB" => Ok(PartitionId::BottomRight),
            other => {
                let parsed = other.strip_prefix('S').and_then(|rest| {
                    let (index, count) = rest.split_once('/')?;
                    Some((index.parse::<u8>().ok()?, count.parse::<u8>().ok()?))
                });
                match parsed {
                    Some((index, count)) if index < count => {
                        Ok(PartitionId::Strip { index, count })
                    }
                    _ => Err(format!("unknown partition id '{other}'")),
                }
            }
        }
    }
}

impl From<PartitionId> for String {
    fn from(id: PartitionId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for PartitionId {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// A rectangular sub-region of one physical page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Partition {
    pub page_index: usize,
    pub id: PartitionId,
    pub bounds: BBox,
}

/// Split a physical page into the partitions of `scheme`, in reading order.
pub fn partition_page(
    page: &PhysicalPage,
    scheme: PartitionScheme,
) -> Result<Vec<Partition>, FolioError> {
    if page.bounds().is_degenerate() {
        return Err(FolioError::EmptyPage {
            index: page.index,
            width: page.width,
            height: page.height,
        });
    }

    Ok(scheme
        .ids()
        .into_iter()
        .map(|id| Partition {
            page_index: page.index,
            id,
            bounds: id.region(page.width, page.height),
        })
        .collect())
}
