/// Events emitted during a simulation pass.
/// The presentation layer consumes these for painting and sound; cell
/// paints fire after every grid mutation plus the display-only skull
/// frames, so an incremental renderer never misses a change.

use crate::domain::element::Element;
use crate::domain::miner::Look;

#[derive(Clone, Copy, Debug)]
pub enum GameEvent {
    Paint { x: usize, y: usize, elem: Element },
    MinerMoved { x: usize, y: usize },
    MinerHidden,
    LookChanged(Look),
    DiamondPicked { collected: u8, total: u8 },
    Jumped,
    Died,
    CaveCleared,
    Paused(bool),
}
