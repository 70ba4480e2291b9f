pub mod favorites_page;
