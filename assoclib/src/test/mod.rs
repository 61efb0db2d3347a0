mod simulator_tests;
