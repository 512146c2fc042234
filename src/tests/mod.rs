mod htable_directory_test;
mod page_guard_test;
mod trie_test;
