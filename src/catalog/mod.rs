pub mod test_pages;
