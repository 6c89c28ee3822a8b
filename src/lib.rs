// Live pin overlay: matches configured pins against the objects of the
// current game area, snaps them onto the walkable grid, paths to them and
// draws everything onto the large overlay and the corner mini-map.

pub mod engine;
