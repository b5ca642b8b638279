mod circuit_breaker;
mod health;
