pub mod state_token;
