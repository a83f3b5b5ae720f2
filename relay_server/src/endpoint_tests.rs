mod helpers;
mod misc;
mod relay;
