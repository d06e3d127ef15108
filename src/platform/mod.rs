pub mod healing;
