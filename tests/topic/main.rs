mod fixtures;

mod crud;
