mod cache;
mod common;
mod offering;
mod routing;
