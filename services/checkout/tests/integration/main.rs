mod helpers;

mod producer_test;
