mod events;
mod readings;
mod sessions;
